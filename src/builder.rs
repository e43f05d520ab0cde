//! Builder Module
//!
//! Fluent builder for [`FeedGenerator`], the facade that reads records,
//! assembles the feed and renders it.

use chrono::Utc;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

use crate::api::{InputFormat, OutputFormat, SheetSelector};
use crate::assembler::FeedAssembler;
use crate::error::FeedError;
use crate::output::OutputFormatter;
use crate::parser::{read_json_records, WorkbookReader};
use crate::schema::{FeedSchema, TagSource, DEFAULT_CURRENCY, VENDOR_ID_MAX_LENGTH};
use crate::security::SecurityConfig;
use crate::types::{Feed, FeedReport, Record};

/// Settings of one generator
///
/// Every field has a default, so a configuration file only needs the keys it
/// changes:
///
/// ```json
/// {
///   "currency": "EUR",
///   "parallel": true,
///   "sheet": {"name": "Listings"},
///   "schema": {"active_tokens": ["TRUE", "YES", "1", "Y"]}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Literal substituted for the `{{currency}}` tag
    pub currency: String,

    /// Maximum vendorId length in characters
    pub vendor_id_max_length: usize,

    /// Spreadsheet row number of the first record, used in diagnostics
    pub first_data_row: usize,

    /// Run the per-record step on the rayon pool
    pub parallel: bool,

    pub output_format: OutputFormat,

    /// Worksheet to read for XLSX input
    pub sheet: SheetSelector,

    pub schema: FeedSchema,

    /// Input limits; not part of configuration files
    #[serde(skip)]
    pub security: SecurityConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            vendor_id_max_length: VENDOR_ID_MAX_LENGTH,
            first_data_row: 2,
            parallel: false,
            output_format: OutputFormat::Xml,
            sheet: SheetSelector::default(),
            schema: FeedSchema::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub(crate) fn validate(&self) -> Result<(), FeedError> {
        if self.currency.trim().is_empty() {
            return Err(FeedError::Config("Currency must not be empty".to_string()));
        }

        if self.vendor_id_max_length == 0 {
            return Err(FeedError::Config(
                "vendorId max length must be greater than 0".to_string(),
            ));
        }

        if self.first_data_row == 0 {
            return Err(FeedError::Config(
                "First data row must be at least 1".to_string(),
            ));
        }

        let schema = &self.schema;
        if schema.active_tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(FeedError::Config(
                "At least one active token is required".to_string(),
            ));
        }

        if schema.column_names().any(|name| name.trim().is_empty()) {
            return Err(FeedError::Config(
                "Column name must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for rule in &schema.tags {
            if rule.token.is_empty() {
                return Err(FeedError::Config("Tag token must not be empty".to_string()));
            }
            if !seen.insert(rule.token.as_str()) {
                return Err(FeedError::Config(format!(
                    "Duplicate tag token: '{}'",
                    rule.token
                )));
            }
            match &rule.source {
                TagSource::Currency => {}
                TagSource::Column(name) if name.trim().is_empty() => {
                    return Err(FeedError::Config(format!(
                        "Tag '{}' has an empty source column",
                        rule.token
                    )));
                }
                TagSource::Column(_) => {}
                TagSource::ResolvedField(field) => {
                    if !schema.substituted_fields.contains(field) {
                        return Err(FeedError::Config(format!(
                            "Tag '{}' refers to field '{}' which is not substituted",
                            rule.token, field
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Fluent builder for [`FeedGenerator`]
///
/// All settings have defaults; override only what you need.
///
/// # Example
///
/// ```rust
/// use adfeed::{FeedGeneratorBuilder, OutputFormat};
///
/// # fn main() -> Result<(), adfeed::FeedError> {
/// let generator = FeedGeneratorBuilder::new()
///     .with_currency("EUR")
///     .with_output_format(OutputFormat::Xml)
///     .parallel(true)
///     .build()?;
/// # let _ = generator;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct FeedGeneratorBuilder {
    config: FeedConfig,
}

impl FeedGeneratorBuilder {
    pub fn new() -> Self {
        Self {
            config: FeedConfig::default(),
        }
    }

    /// Replace every setting, e.g. with one loaded by [`FeedConfig::from_path`]
    pub fn with_config(mut self, config: FeedConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.config.currency = currency.into();
        self
    }

    pub fn with_vendor_id_max_length(mut self, length: usize) -> Self {
        self.config.vendor_id_max_length = length;
        self
    }

    /// Row number reported for the first record (default 2, below the header)
    pub fn with_first_data_row(mut self, row: usize) -> Self {
        self.config.first_data_row = row;
        self
    }

    pub fn with_schema(mut self, schema: FeedSchema) -> Self {
        self.config.schema = schema;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet = selector;
        self
    }

    pub fn with_security_config(mut self, security: SecurityConfig) -> Self {
        self.config.security = security;
        self
    }

    pub fn parallel(mut self, enabled: bool) -> Self {
        self.config.parallel = enabled;
        self
    }

    /// Validate the settings and build the generator
    ///
    /// # Errors
    ///
    /// `FeedError::Config` for an empty currency, a zero length limit, a zero
    /// first data row, no active tokens, an empty column name, or an empty,
    /// duplicate or dangling tag.
    pub fn build(self) -> Result<FeedGenerator, FeedError> {
        self.config.validate()?;
        Ok(FeedGenerator::new(self.config))
    }
}

/// Feed generation facade
///
/// Build with [`FeedGeneratorBuilder`]. A generator is immutable and can be
/// reused for any number of inputs.
#[derive(Debug)]
pub struct FeedGenerator {
    config: FeedConfig,
}

impl FeedGenerator {
    pub(crate) fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Read a record set without processing it
    pub fn read_records<R: Read>(&self, input: R, format: InputFormat) -> Result<Vec<Record>, FeedError> {
        let security = &self.config.security;
        let records = match format {
            InputFormat::Xlsx => WorkbookReader::open(input, security)?.read_records(&self.config.sheet)?,
            InputFormat::Json => read_json_records(input, security)?,
        };
        security.check_record_count(records.len())?;
        Ok(records)
    }

    /// Process records into a feed; never fails, bad records are skipped
    pub fn assemble(&self, records: &[Record]) -> Feed {
        FeedAssembler::new(&self.config).assemble(records)
    }

    /// Render a feed in the configured output format
    pub fn render<W: Write>(&self, feed: &Feed, output: W) -> Result<(), FeedError> {
        let mut writer = BufWriter::new(output);
        OutputFormatter::from_format(self.config.output_format).render(feed, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Read `input`, assemble the feed and write it to `output`
    ///
    /// # Errors
    ///
    /// Only whole-run failures are errors: unreadable input, input limits, or
    /// output I/O. Records that fail validation end up in the report.
    ///
    /// # Example
    ///
    /// ```rust
    /// use adfeed::{FeedGeneratorBuilder, InputFormat};
    ///
    /// # fn main() -> Result<(), adfeed::FeedError> {
    /// let input = r#"[{"Available": "TRUE", "vendorId": "V1", "title": "Flat",
    ///                  "description": "Nice", "categoryId": 5, "priceType": "FREE"}]"#;
    /// let generator = FeedGeneratorBuilder::new().build()?;
    /// let mut xml = Vec::new();
    /// let report = generator.generate(input.as_bytes(), InputFormat::Json, &mut xml)?;
    /// assert_eq!(report.stats.processed_count, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn generate<R: Read, W: Write>(
        &self,
        input: R,
        format: InputFormat,
        output: W,
    ) -> Result<FeedReport, FeedError> {
        let records = self.read_records(input, format)?;
        info!(records = records.len(), parallel = self.config.parallel, "generating feed");

        let feed = self.assemble(&records);
        self.render(&feed, output)?;

        Ok(FeedReport {
            generated_at: Utc::now(),
            stats: feed.stats,
        })
    }

    /// Like [`generate`](Self::generate), returning the rendered feed as a string
    pub fn generate_to_string<R: Read>(
        &self,
        input: R,
        format: InputFormat,
    ) -> Result<(String, FeedReport), FeedError> {
        let mut buffer = Vec::new();
        let report = self.generate(input, format, &mut buffer)?;
        Ok((String::from_utf8(buffer)?, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TagRule;

    const RECORDS: &str = r#"[
        {"Available": "TRUE", "vendorId": "V1", "title": "Flat", "description": "Nice",
         "categoryId": 5, "priceType": "FIXED_PRICE", "price": "1200"},
        {"Available": "no", "vendorId": "V2"},
        {"Available": "TRUE", "vendorId": "V3", "title": "Room", "description": "Small",
         "categoryId": "x", "priceType": "FREE"}
    ]"#;

    #[test]
    fn test_builder_defaults() {
        let builder = FeedGeneratorBuilder::new();
        assert_eq!(builder.config.currency, "EUR");
        assert_eq!(builder.config.vendor_id_max_length, 64);
        assert_eq!(builder.config.first_data_row, 2);
        assert!(!builder.config.parallel);
        assert_eq!(builder.config.output_format, OutputFormat::Xml);
        assert_eq!(builder.config.sheet, SheetSelector::Index(0));
    }

    #[test]
    fn test_builder_method_chaining() {
        let builder = FeedGeneratorBuilder::new()
            .with_currency("USD")
            .with_vendor_id_max_length(32)
            .with_first_data_row(5)
            .with_output_format(OutputFormat::Json)
            .with_sheet_selector(SheetSelector::Name("Ads".to_string()))
            .parallel(true);

        assert_eq!(builder.config.currency, "USD");
        assert_eq!(builder.config.vendor_id_max_length, 32);
        assert_eq!(builder.config.first_data_row, 5);
        assert_eq!(builder.config.output_format, OutputFormat::Json);
        assert!(matches!(
            builder.config.sheet,
            SheetSelector::Name(ref name) if name == "Ads"
        ));
        assert!(builder.config.parallel);
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_build_rejects_empty_currency() {
        match FeedGeneratorBuilder::new().with_currency("  ").build() {
            Err(FeedError::Config(msg)) => assert!(msg.contains("Currency")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_build_rejects_zero_lengths() {
        assert!(matches!(
            FeedGeneratorBuilder::new().with_vendor_id_max_length(0).build(),
            Err(FeedError::Config(_))
        ));
        assert!(matches!(
            FeedGeneratorBuilder::new().with_first_data_row(0).build(),
            Err(FeedError::Config(_))
        ));
    }

    #[test]
    fn test_build_rejects_bad_schema() {
        let no_tokens = FeedSchema {
            active_tokens: vec![" ".to_string()],
            ..FeedSchema::default()
        };
        assert!(matches!(
            FeedGeneratorBuilder::new().with_schema(no_tokens).build(),
            Err(FeedError::Config(_))
        ));

        let blank_column = FeedSchema {
            url_column: String::new(),
            ..FeedSchema::default()
        };
        match FeedGeneratorBuilder::new().with_schema(blank_column).build() {
            Err(FeedError::Config(msg)) => assert!(msg.contains("Column name")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_build_rejects_bad_tags() {
        let mut duplicate = FeedSchema::default();
        duplicate
            .tags
            .push(TagRule::new("{{currency}}", TagSource::Currency));
        match FeedGeneratorBuilder::new().with_schema(duplicate).build() {
            Err(FeedError::Config(msg)) => assert!(msg.contains("Duplicate tag")),
            _ => panic!("Expected Config error"),
        }

        let mut empty = FeedSchema::default();
        empty.tags.push(TagRule::new("", TagSource::Currency));
        assert!(matches!(
            FeedGeneratorBuilder::new().with_schema(empty).build(),
            Err(FeedError::Config(_))
        ));

        let mut dangling = FeedSchema::default();
        dangling.tags.push(TagRule::new(
            "{{summary}}",
            TagSource::ResolvedField("summary".to_string()),
        ));
        assert!(matches!(
            FeedGeneratorBuilder::new().with_schema(dangling).build(),
            Err(FeedError::Config(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config = FeedConfig::from_json_str(
            r#"{"currency": "USD", "parallel": true, "output_format": "json",
                "sheet": {"name": "Listings"}, "schema": {"active_tokens": ["Y"]}}"#,
        )
        .unwrap();
        assert_eq!(config.currency, "USD");
        assert!(config.parallel);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.sheet, SheetSelector::Name("Listings".to_string()));
        assert_eq!(config.schema.active_tokens, vec!["Y"]);
        // untouched keys keep their defaults
        assert_eq!(config.vendor_id_max_length, 64);
        assert_eq!(config.schema.image_columns.len(), 9);
    }

    #[test]
    fn test_config_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"currency": "GBP", "first_data_row": 3}}"#).unwrap();

        let config = FeedConfig::from_path(file.path()).unwrap();
        assert_eq!(config.currency, "GBP");
        assert_eq!(config.first_data_row, 3);

        assert!(matches!(
            FeedConfig::from_path(file.path().with_extension("missing")),
            Err(FeedError::Io(_))
        ));
    }

    #[test]
    fn test_config_from_invalid_json() {
        assert!(matches!(
            FeedConfig::from_json_str("{currency:"),
            Err(FeedError::Json(_))
        ));
    }

    #[test]
    fn test_generate_from_json_records() {
        let generator = FeedGeneratorBuilder::new().build().unwrap();
        let (xml, report) = generator
            .generate_to_string(RECORDS.as_bytes(), InputFormat::Json)
            .unwrap();

        assert_eq!(report.stats.total_records, 3);
        assert_eq!(report.stats.processed_count, 1);
        assert_eq!(report.stats.inactive_count, 1);
        assert_eq!(report.stats.skipped_count, 1);
        assert_eq!(
            report.stats.errors[0].reason,
            "Row 4 (V3): schema constraint - invalid categoryId: 'x'"
        );
        assert!(xml.contains("<admarkt:vendorId>V1</admarkt:vendorId>"));
        assert!(xml.contains("<admarkt:price>1200</admarkt:price>"));
        assert!(!xml.contains("V3"));
    }

    #[test]
    fn test_generate_json_output() {
        let generator = FeedGeneratorBuilder::new()
            .with_output_format(OutputFormat::Json)
            .build()
            .unwrap();
        let (json, _) = generator
            .generate_to_string(RECORDS.as_bytes(), InputFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["listings"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_report_serialization() {
        let generator = FeedGeneratorBuilder::new().build().unwrap();
        let (_, report) = generator
            .generate_to_string(RECORDS.as_bytes(), InputFormat::Json)
            .unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["generatedAt"].is_string());
        assert_eq!(value["processedCount"], 1);
        assert_eq!(value["errors"][0]["vendorId"], "V3");
    }

    #[test]
    fn test_record_count_limit() {
        let generator = FeedGeneratorBuilder::new()
            .with_security_config(SecurityConfig {
                max_record_count: 2,
                ..SecurityConfig::default()
            })
            .build()
            .unwrap();
        assert!(matches!(
            generator.read_records(RECORDS.as_bytes(), InputFormat::Json),
            Err(FeedError::SecurityViolation(_))
        ));
    }

    #[test]
    fn test_invalid_xlsx_input() {
        let generator = FeedGeneratorBuilder::new().build().unwrap();
        let result = generator.generate(&b"plain text"[..], InputFormat::Xlsx, Vec::new());
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }
}
