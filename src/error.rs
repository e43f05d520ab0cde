//! Error Types Module
//!
//! Structured error types used across the crate, built on `thiserror`.
//!
//! Two layers exist:
//!
//! - [`FeedError`] aborts a whole invocation (unreadable input, broken
//!   configuration, output I/O failure).
//! - [`RecordError`] describes why a single record was left out of the feed.
//!   It never aborts a batch; the assembler turns it into a diagnostic entry.

use thiserror::Error;

/// Error type for operations that fail as a whole
///
/// # Variants
///
/// - `Io`: reading the input or writing the rendered feed failed
/// - `Parse`: the workbook could not be read by calamine
/// - `Json`: JSON input or configuration could not be decoded
/// - `Xml`: writing or re-reading the XML document failed
/// - `Config`: the builder rejected the configuration
/// - `InvalidInput`: the input is not a record set at all
/// - `SecurityViolation`: input limits were exceeded
///
/// # Example
///
/// ```rust,no_run
/// use adfeed::FeedError;
/// use std::fs::File;
///
/// fn open_rows(path: &str) -> Result<File, FeedError> {
///     let file = File::open(path)?; // converted into FeedError::Io
///     Ok(file)
/// }
/// ```
#[derive(Error, Debug)]
pub enum FeedError {
    /// An I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// calamine failed to read the workbook
    #[error("Failed to parse workbook: {0}")]
    Parse(#[from] calamine::Error),

    /// serde_json failed to decode or encode a document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// quick-xml failed to write or read the feed document
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Rendered output was not valid UTF-8
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The configuration failed validation in `FeedGeneratorBuilder::build()`
    ///
    /// ```rust
    /// use adfeed::{FeedError, FeedGeneratorBuilder};
    ///
    /// let result = FeedGeneratorBuilder::new().with_currency("").build();
    /// assert!(matches!(result, Err(FeedError::Config(_))));
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input could not be interpreted as a set of records
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The input exceeded one of the configured limits
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

/// Broad category of a per-record failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required field is absent or blank after tag substitution
    MissingField,
    /// A value breaks a fixed schema rule (length, enumeration, positivity)
    SchemaConstraint,
    /// A value could not be coerced to the numeric type it must have
    DataType,
    /// Listing construction failed for any other reason
    Unexpected,
}

/// Why a single record was skipped
///
/// The `Display` output is the reason text carried into the feed's error
/// list, so it always surfaces the offending value where there is one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    #[error("vendorId too long ({actual} > {limit})")]
    VendorIdTooLong { actual: usize, limit: usize },

    #[error("invalid priceType: '{value}'")]
    InvalidPriceType { value: String },

    #[error("categoryId must be positive, got: {value}")]
    NonPositiveCategory { value: i64 },

    #[error("invalid categoryId: '{raw}'")]
    InvalidCategory { raw: String },

    #[error("{message}")]
    Unexpected { message: String },
}

impl RecordError {
    /// Category of this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::MissingField { .. } => ErrorKind::MissingField,
            RecordError::VendorIdTooLong { .. }
            | RecordError::InvalidPriceType { .. }
            | RecordError::NonPositiveCategory { .. } => ErrorKind::SchemaConstraint,
            RecordError::InvalidCategory { .. } => ErrorKind::DataType,
            RecordError::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    pub(crate) fn unexpected(message: impl Into<String>) -> Self {
        RecordError::Unexpected {
            message: message.into(),
        }
    }
}
