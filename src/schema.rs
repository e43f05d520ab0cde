//! Schema Module
//!
//! Fixed tables of the target feed schema and of the expected input columns.
//!
//! The constants describe the marketplace feed this crate produces. They are
//! gathered into a [`FeedSchema`] value so that configuration files and tests
//! can swap individual tables without touching the pipeline.

use serde::{Deserialize, Serialize};

/// Namespace URI of the feed document
pub const FEED_NAMESPACE: &str = "http://admarkt.marktplaats.nl/schemas/1.0";

/// Element prefix bound to [`FEED_NAMESPACE`]
pub const FEED_PREFIX: &str = "admarkt";

/// Maximum length of `vendorId` in the feed schema (characters)
pub const VENDOR_ID_MAX_LENGTH: usize = 64;

/// Maximum length of an attribute name in the feed schema
pub const ATTRIBUTE_NAME_MAX_LENGTH: usize = 32;

/// Maximum length of an attribute value in the feed schema
pub const ATTRIBUTE_VALUE_MAX_LENGTH: usize = 32;

/// Currency literal used by the `{{currency}}` tag
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Required fields, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 5] = ["vendorId", "title", "description", "categoryId", "priceType"];

pub const VENDOR_ID_COLUMN: &str = "vendorId";
pub const TITLE_COLUMN: &str = "title";
pub const DESCRIPTION_COLUMN: &str = "description";
pub const CATEGORY_COLUMN: &str = "categoryId";
pub const PRICE_TYPE_COLUMN: &str = "priceType";
pub const PRICE_COLUMN: &str = "price";
pub const URL_COLUMN: &str = "url";

/// Attribute columns, in output order
pub const ATTRIBUTE_COLUMNS: [&str; 3] = ["area_sqm", "property_type", "deal_type"];

/// Attribute column that gets the area fallback
pub const AREA_COLUMN: &str = "area_sqm";

pub const PRIMARY_IMAGE_COLUMN: &str = "image_link";

/// Secondary image slots, in output order
pub const IMAGE_COLUMNS: [&str; 9] = [
    "img_2", "img_3", "img_4", "img_5", "img_6", "img_7", "img_8", "img_9", "img_10",
];

pub const ACTIVE_COLUMN: &str = "Available";

/// Values of the active flag (trimmed, upper-cased) that keep a record
pub const ACTIVE_TOKENS: [&str; 3] = ["TRUE", "YES", "1"];

/// Long description field; tags may reference its resolved value
pub const CENTRE_DESCRIPTION_COLUMN: &str = "Centre_description";

/// Lead-in text prepended to the description
pub const LEAD_IN_COLUMN: &str = "preheader";

/// Fields that go through tag substitution, in processing order
pub const SUBSTITUTED_FIELDS: [&str; 4] = [
    TITLE_COLUMN,
    CENTRE_DESCRIPTION_COLUMN,
    LEAD_IN_COLUMN,
    DESCRIPTION_COLUMN,
];

/// Where a tag's replacement value comes from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TagSource {
    /// The configured currency literal
    Currency,

    /// Cleaned text of a column of the original record
    Column(String),

    /// Value of a field already resolved earlier in the same record
    ResolvedField(String),
}

/// One entry of the tag table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagRule {
    pub token: String,
    pub source: TagSource,
}

impl TagRule {
    pub fn new(token: impl Into<String>, source: TagSource) -> Self {
        Self {
            token: token.into(),
            source,
        }
    }
}

/// The default tag table
pub fn default_tags() -> Vec<TagRule> {
    vec![
        TagRule::new(
            "{{Centre_description}}",
            TagSource::ResolvedField(CENTRE_DESCRIPTION_COLUMN.to_string()),
        ),
        TagRule::new("{{center_name}}", TagSource::Column("center_name".to_string())),
        TagRule::new("{{price}}", TagSource::Column("price (mirror)".to_string())),
        TagRule::new("{{currency}}", TagSource::Currency),
        TagRule::new("{{area_Min}}", TagSource::Column(AREA_COLUMN.to_string())),
        TagRule::new("{{area_Max}}", TagSource::Column("area_max".to_string())),
    ]
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// Column and tag tables used by one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedSchema {
    pub required_fields: Vec<String>,
    pub attribute_columns: Vec<String>,
    pub area_column: String,
    pub primary_image_column: String,
    pub image_columns: Vec<String>,
    pub url_column: String,
    pub active_column: String,
    pub active_tokens: Vec<String>,
    pub lead_in_column: String,
    pub substituted_fields: Vec<String>,
    pub tags: Vec<TagRule>,
}

impl Default for FeedSchema {
    fn default() -> Self {
        Self {
            required_fields: owned(&REQUIRED_FIELDS),
            attribute_columns: owned(&ATTRIBUTE_COLUMNS),
            area_column: AREA_COLUMN.to_string(),
            primary_image_column: PRIMARY_IMAGE_COLUMN.to_string(),
            image_columns: owned(&IMAGE_COLUMNS),
            url_column: URL_COLUMN.to_string(),
            active_column: ACTIVE_COLUMN.to_string(),
            active_tokens: owned(&ACTIVE_TOKENS),
            lead_in_column: LEAD_IN_COLUMN.to_string(),
            substituted_fields: owned(&SUBSTITUTED_FIELDS),
            tags: default_tags(),
        }
    }
}

impl FeedSchema {
    /// Every column name the schema refers to, for configuration checks
    pub(crate) fn column_names(&self) -> impl Iterator<Item = &String> {
        self.required_fields
            .iter()
            .chain(&self.attribute_columns)
            .chain(&self.image_columns)
            .chain(&self.substituted_fields)
            .chain([
                &self.area_column,
                &self.primary_image_column,
                &self.url_column,
                &self.active_column,
                &self.lead_in_column,
            ])
    }

    /// Whether an active-flag value keeps the record
    pub fn is_active_token(&self, raw: &str) -> bool {
        let token = raw.trim().to_uppercase();
        self.active_tokens
            .iter()
            .any(|t| t.trim().to_uppercase() == token)
    }
}
