//! Formatter Module
//!
//! Turns free text into the markup accepted by the feed's description field.
//!
//! Text that already contains markup only has its line breaks converted.
//! Plain text is escaped, split into paragraphs and wrapped in `<p>`.

/// Line-break marker
const LINE_BREAK: &str = "<br>";

/// Bullet glyph that must start on its own line
const BULLET: char = '•';

/// Description formatter
///
/// Stateless; formatting already formatted output returns it unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl TextFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Format `text` for the description element
    ///
    /// # Steps
    ///
    /// 1. Line endings are normalised to `\n` and outer whitespace trimmed.
    /// 2. Text containing both `<` and `>` counts as markup: runs of blank
    ///    lines collapse to one, blank lines become `<br><br>` and single
    ///    newlines `<br>`.
    /// 3. Anything else is plain text: `&`, `<` and `>` are escaped, a
    ///    bullet after a newline gets a `<br>` in front of it, blank lines
    ///    split paragraphs, newlines inside a paragraph become `<br>` and
    ///    each non-empty paragraph is wrapped in `<p>...</p>`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use adfeed::TextFormatter;
    ///
    /// let html = TextFormatter::new().format("Bright flat\nnear the park\n\nAvailable now");
    /// assert_eq!(html, "<p>Bright flat<br>near the park</p><p>Available now</p>");
    /// ```
    pub fn format(&self, text: &str) -> String {
        let normalized = normalize_line_endings(text);
        let trimmed = normalized.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        if contains_markup(trimmed) {
            self.format_markup(trimmed)
        } else {
            self.format_plain(trimmed)
        }
    }

    fn format_markup(&self, text: &str) -> String {
        let mut collapsed = text.to_string();
        while collapsed.contains("\n\n\n") {
            collapsed = collapsed.replace("\n\n\n", "\n\n");
        }
        collapsed
            .replace("\n\n", &LINE_BREAK.repeat(2))
            .replace('\n', LINE_BREAK)
    }

    fn format_plain(&self, text: &str) -> String {
        let escaped = escape_html(text);
        let bulleted = escaped.replace(&format!("\n{}", BULLET), &format!("{}{}", LINE_BREAK, BULLET));

        bulleted
            .split("\n\n")
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .map(|paragraph| format!("<p>{}</p>", paragraph.replace('\n', LINE_BREAK)))
            .collect()
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn contains_markup(text: &str) -> bool {
    text.contains('<') && text.contains('>')
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
