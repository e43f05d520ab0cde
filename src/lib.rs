//! adfeed - Marketplace advertisement feed generator
//!
//! This crate turns loosely-typed inventory rows (spreadsheet or JSON) into
//! a validated advertisement feed document. Each row is filtered by its
//! active flag, has template tags substituted, is validated against the
//! feed schema, gets numeric fallbacks applied, and has its images,
//! attributes and description formatted. Rows that fail are skipped with a
//! diagnostic; the batch always completes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use adfeed::{FeedGeneratorBuilder, InputFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a generator with default settings
//!     let generator = FeedGeneratorBuilder::new().build()?;
//!
//!     let input = File::open("inventory.xlsx")?;
//!     let output = File::create("feed.xml")?;
//!
//!     let report = generator.generate(input, InputFormat::Xlsx, output)?;
//!     println!(
//!         "{} listings, {} skipped",
//!         report.stats.processed_count, report.stats.skipped_count
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use std::fs::File;
//! use adfeed::{FeedConfig, FeedGeneratorBuilder, InputFormat, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let generator = FeedGeneratorBuilder::new()
//!         .with_config(FeedConfig::from_path("feed-config.json")?)
//!         .with_sheet_selector(SheetSelector::Name("Listings".to_string()))
//!         .parallel(true)
//!         .build()?;
//!
//!     let (xml, report) = generator.generate_to_string(File::open("inventory.xlsx")?, InputFormat::Xlsx)?;
//!     for skipped in &report.stats.errors {
//!         eprintln!("{}", skipped.reason);
//!     }
//!     println!("{}", xml);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Checking a Feed
//!
//! ```rust,no_run
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let xml = std::fs::read("feed.xml")?;
//!     let report = adfeed::verify_feed(&xml)?;
//!     for issue in &report.issues {
//!         eprintln!("{}", issue);
//!     }
//!     Ok(())
//! }
//! ```

mod api;
mod assembler;
mod builder;
mod error;
mod extract;
mod fallback;
mod formatter;
mod output;
mod parser;
mod schema;
mod security;
mod substitution;
mod types;
mod validation;
mod verify;

pub use api::{InputFormat, OutputFormat, PriceType, SheetSelector, UnknownPriceType};
pub use assembler::{compose_description, fold_outcomes, FeedAssembler, RecordOutcome, Stage};
pub use builder::{FeedConfig, FeedGenerator, FeedGeneratorBuilder};
pub use error::{ErrorKind, FeedError, RecordError};
pub use extract::{is_absolute_url, AttributeAndMediaExtractor, Extracted};
pub use fallback::{resolve_area, resolve_price};
pub use formatter::TextFormatter;
pub use output::{JsonFeedFormatter, OutputFormatter, XmlFeedFormatter};
pub use parser::{read_json_records, WorkbookReader};
pub use schema::{default_tags, FeedSchema, TagRule, TagSource, FEED_NAMESPACE, FEED_PREFIX};
pub use security::SecurityConfig;
pub use substitution::{Substitution, SubstitutionContext, SubstitutionEvent, TagSubstitutionEngine};
pub use types::{Attribute, Feed, FeedReport, FeedStats, Listing, Record, SkippedRecord, Value};
pub use validation::{CheckedFields, ConstraintValidator, FieldValidator};
pub use verify::{verify_feed, VerificationIssue, VerificationReport};
