//! Types Module
//!
//! Common data types shared by the pipeline stages.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::api::PriceType;
use crate::error::RecordError;

/// A loosely-typed scalar taken from one input cell
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Empty cell or JSON `null`
    #[default]
    Empty,

    /// Logical value
    Bool(bool),

    /// Numeric value (f64)
    Number(f64),

    /// Text value
    Text(String),
}

impl Value {
    /// Whether the value counts as missing (empty, or text that is blank)
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }

    /// String coercion, before any trimming
    ///
    /// Whole numbers are printed without a fractional part (`5.0` becomes
    /// `"5"`), booleans as `TRUE`/`FALSE`.
    pub fn as_raw_string(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::Text(s) => s.clone(),
        }
    }

    /// Cleaned text: string coercion with outer whitespace removed
    pub fn clean_text(&self) -> String {
        self.as_raw_string().trim().to_string()
    }

    /// Real-number reading of the value, if it has one
    ///
    /// Text is trimmed before parsing. Non-finite results (`NaN`, `inf`)
    /// count as unparseable.
    pub fn as_f64(&self) -> Option<f64> {
        let number = match self {
            Value::Number(n) => *n,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            Value::Empty | Value::Bool(_) => return None,
        };
        number.is_finite().then_some(number)
    }

    /// Numeric reading truncated toward zero
    pub fn as_truncated_int(&self) -> Option<i64> {
        self.as_f64().map(|n| n.trunc() as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One input row: column name to loosely-typed value, in source column order
///
/// A column that is absent and a column holding an empty string both read as
/// missing through [`Record::is_present`]; [`Record::contains`] tells them
/// apart. Records are never mutated by the pipeline: [`Record::with`] returns
/// an updated copy.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion used when constructing records
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Copy of this record with one column replaced or added
    pub fn with(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut copy = self.clone();
        copy.fields.insert(key.to_string(), value.into());
        copy
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether the column exists at all, even if empty
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Whether the column exists and is not blank
    pub fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_blank())
    }

    /// Cleaned text of a column; absent columns read as `""`
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(Value::clean_text).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A name/value attribute pair of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Whether `c` may appear in an XML 1.0 document
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// First character of `text` that XML 1.0 forbids
pub(crate) fn illegal_xml_char(text: &str) -> Option<char> {
    text.chars().find(|c| !is_xml_char(*c))
}

fn check_xml_text(field: &str, text: &str) -> Result<(), RecordError> {
    match illegal_xml_char(text) {
        Some(c) => Err(RecordError::unexpected(format!(
            "{} contains character U+{:04X} not allowed in XML",
            field, c as u32
        ))),
        None => Ok(()),
    }
}

/// Inputs for [`Listing::new`]
#[derive(Debug, Clone)]
pub(crate) struct ListingParts {
    pub vendor_id: String,
    pub title: String,
    pub description: String,
    pub category_id: u64,
    pub price_type: PriceType,
    pub price: u64,
    pub url: Option<String>,
    pub images: Vec<String>,
    pub attributes: Vec<Attribute>,
}

/// One validated advertisement
///
/// Constructed once per record through [`Listing::new`], which re-checks the
/// invariants of the typed result; fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    vendor_id: String,
    title: String,
    description: String,
    category_id: u64,
    price_type: PriceType,
    price: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    images: Vec<String>,
    attributes: Vec<Attribute>,
}

impl Listing {
    pub(crate) fn new(parts: ListingParts, vendor_id_max_length: usize) -> Result<Self, RecordError> {
        if parts.vendor_id.is_empty() || parts.title.is_empty() || parts.description.is_empty() {
            return Err(RecordError::unexpected(
                "listing text field became empty during construction",
            ));
        }
        let vendor_id_len = parts.vendor_id.chars().count();
        if vendor_id_len > vendor_id_max_length {
            return Err(RecordError::unexpected(format!(
                "vendorId length {} exceeds {} after cleaning",
                vendor_id_len, vendor_id_max_length
            )));
        }
        if parts.category_id == 0 {
            return Err(RecordError::unexpected("categoryId resolved to zero"));
        }
        if parts.price_type.requires_price() && parts.price == 0 {
            return Err(RecordError::unexpected(format!(
                "price for {} resolved to zero",
                parts.price_type
            )));
        }
        if !parts.price_type.requires_price() && parts.price != 0 {
            return Err(RecordError::unexpected(format!(
                "price for {} must be zero, got {}",
                parts.price_type, parts.price
            )));
        }
        if parts.attributes.iter().any(|a| a.value.is_empty()) {
            return Err(RecordError::unexpected("attribute with empty value"));
        }

        check_xml_text("vendorId", &parts.vendor_id)?;
        check_xml_text("title", &parts.title)?;
        check_xml_text("description", &parts.description)?;
        if let Some(url) = &parts.url {
            check_xml_text("url", url)?;
        }
        for image in &parts.images {
            check_xml_text("image url", image)?;
        }
        for attribute in &parts.attributes {
            check_xml_text("attribute name", &attribute.name)?;
            check_xml_text(&format!("attribute '{}'", attribute.name), &attribute.value)?;
        }

        Ok(Self {
            vendor_id: parts.vendor_id,
            title: parts.title,
            description: parts.description,
            category_id: parts.category_id,
            price_type: parts.price_type,
            price: parts.price,
            url: parts.url,
            images: parts.images,
            attributes: parts.attributes,
        })
    }

    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Formatted description markup
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category_id(&self) -> u64 {
        self.category_id
    }

    pub fn price_type(&self) -> PriceType {
        self.price_type
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Image URLs; the first one is the primary image
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// Diagnostic entry for a record that was left out of the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    /// Vendor id of the record, or `ROW-<n>` when it has none
    pub vendor_id: String,
    pub reason: String,
}

/// Run statistics of one feed generation
///
/// `processed_count + skipped_count + inactive_count == total_records`
/// always holds; every skipped record has exactly one entry in `errors`.
/// Inactive records are counted but never logged as errors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStats {
    pub total_records: usize,
    pub processed_count: usize,
    pub skipped_count: usize,
    pub inactive_count: usize,
    pub errors: Vec<SkippedRecord>,
}

/// The ordered listings of one run plus its statistics
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Feed {
    pub listings: Vec<Listing>,
    pub stats: FeedStats,
}

/// Diagnostics handed back to the caller of the generator facade
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedReport {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: FeedStats,
}
