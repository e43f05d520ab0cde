//! Tag Substitution Module
//!
//! Resolves the fixed set of `{{...}}` placeholders inside the text fields of
//! a record.
//!
//! Fields are processed in a fixed order (title, long description, lead-in,
//! description). A tag may stand for the already-substituted value of an
//! earlier field, so the engine threads a [`SubstitutionContext`] through the
//! fields and fills it as each one is resolved. Replacement is a single
//! literal pass: inserted text is never scanned for further tags.

use std::collections::HashMap;

use crate::schema::{TagRule, TagSource};
use crate::types::{Record, Value};

/// One replacement performed while resolving a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionEvent {
    /// Field the token was found in
    pub field: String,
    pub token: String,
    pub value: String,
}

/// Result of substituting one record
#[derive(Debug, Clone)]
pub struct Substitution {
    /// Copy of the input record with substituted fields replaced
    pub record: Record,

    /// Every replacement, in the order it happened
    pub trace: Vec<SubstitutionEvent>,
}

impl Substitution {
    /// `token -> value` pairs joined for a single log line
    pub fn describe_trace(&self) -> String {
        self.trace
            .iter()
            .map(|event| format!("{} -> {}", event.token, event.value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Per-record state of a substitution run
///
/// Holds the source record and the fields resolved so far. It lives for
/// exactly one record.
#[derive(Debug)]
pub struct SubstitutionContext<'a> {
    record: &'a Record,
    currency: &'a str,
    resolved: HashMap<String, String>,
}

impl<'a> SubstitutionContext<'a> {
    pub fn new(record: &'a Record, currency: &'a str) -> Self {
        Self {
            record,
            currency,
            resolved: HashMap::new(),
        }
    }

    /// Value of an already-resolved field, `""` if it has not been resolved
    pub fn resolved(&self, field: &str) -> &str {
        self.resolved.get(field).map(String::as_str).unwrap_or("")
    }

    fn remember(&mut self, field: &str, value: String) {
        self.resolved.insert(field.to_string(), value);
    }

    fn lookup(&self, source: &TagSource) -> String {
        match source {
            TagSource::Currency => self.currency.to_string(),
            TagSource::Column(column) => self.record.text(column),
            TagSource::ResolvedField(field) => self.resolved(field).to_string(),
        }
    }
}

/// Placeholder resolver for the text fields of a record
#[derive(Debug, Clone, Copy)]
pub struct TagSubstitutionEngine<'a> {
    tags: &'a [TagRule],
    fields: &'a [String],
    currency: &'a str,
}

impl<'a> TagSubstitutionEngine<'a> {
    /// # Arguments
    ///
    /// * `tags` - tag table; on overlapping tokens the earlier entry wins
    /// * `fields` - fields to resolve, in processing order
    /// * `currency` - literal for [`TagSource::Currency`]
    pub fn new(tags: &'a [TagRule], fields: &'a [String], currency: &'a str) -> Self {
        Self {
            tags,
            fields,
            currency,
        }
    }

    /// Substitute all configured fields of `record`
    ///
    /// The input is left untouched. A field that is absent stays absent; a
    /// blank field resolves to `""` and produces no events.
    pub fn substitute(&self, record: &Record) -> Substitution {
        let mut context = SubstitutionContext::new(record, self.currency);
        let mut updated = record.clone();
        let mut trace = Vec::new();

        for field in self.fields {
            let resolved = match record.get(field) {
                Some(value) if !value.is_blank() => {
                    self.replace_tags(&value.as_raw_string(), field, &context, &mut trace)
                }
                _ => String::new(),
            };

            if record.contains(field) {
                updated = updated.with(field, Value::Text(resolved.clone()));
            }
            context.remember(field, resolved);
        }

        Substitution {
            record: updated,
            trace,
        }
    }

    /// Single left-to-right pass over `text`
    fn replace_tags(
        &self,
        text: &str,
        field: &str,
        context: &SubstitutionContext<'_>,
        trace: &mut Vec<SubstitutionEvent>,
    ) -> String {
        let mut output = String::with_capacity(text.len());
        let mut rest = text;

        'scan: while let Some(ch) = rest.chars().next() {
            for rule in self.tags {
                if !rule.token.is_empty() && rest.starts_with(rule.token.as_str()) {
                    let value = context.lookup(&rule.source);
                    output.push_str(&value);
                    trace.push(SubstitutionEvent {
                        field: field.to_string(),
                        token: rule.token.clone(),
                        value,
                    });
                    rest = &rest[rule.token.len()..];
                    continue 'scan;
                }
            }
            output.push(ch);
            rest = &rest[ch.len_utf8()..];
        }

        output
    }
}
