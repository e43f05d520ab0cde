//! Feed Assembler Module
//!
//! Runs every record through the pipeline and folds the per-record outcomes
//! into a [`Feed`].
//!
//! Per record:
//!
//! ```text
//! active flag ──no──▶ Inactive (counted, not an error)
//!     │
//!     ▼
//! tag substitution ─▶ field validation ─▶ constraint validation ─▶ listing construction
//!                          │                      │                        │
//!                          └──────────────────────┴────────────────────────┴──▶ Rejected
//! ```
//!
//! A rejection never stops the batch. Records are independent, so the
//! per-record step may run on a rayon pool; outcomes are always folded in
//! input order.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::builder::FeedConfig;
use crate::error::RecordError;
use crate::extract::AttributeAndMediaExtractor;
use crate::fallback::resolve_price;
use crate::formatter::TextFormatter;
use crate::schema::{DESCRIPTION_COLUMN, PRICE_COLUMN, TITLE_COLUMN, VENDOR_ID_COLUMN};
use crate::substitution::TagSubstitutionEngine;
use crate::types::{Feed, Listing, ListingParts, Record, SkippedRecord};
use crate::validation::{CheckedFields, ConstraintValidator, FieldValidator};

/// Pipeline stage at which a record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FieldValidation,
    ConstraintValidation,
    Construction,
}

/// Terminal state of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The active flag did not match; skipped silently
    Inactive,

    /// A listing was built
    Built(Listing),

    /// The record was skipped with a diagnostic
    Rejected {
        /// Vendor id, or `ROW-<n>` when the record has none
        identifier: String,
        /// Spreadsheet row of the record
        row: usize,
        stage: Stage,
        error: RecordError,
    },
}

impl RecordOutcome {
    /// Reason text for the error list; `None` unless rejected
    pub fn reason(&self) -> Option<String> {
        match self {
            RecordOutcome::Rejected {
                identifier,
                row,
                stage,
                error,
            } => Some(rejection_reason(*row, identifier, *stage, error)),
            _ => None,
        }
    }
}

fn rejection_reason(row: usize, identifier: &str, stage: Stage, error: &RecordError) -> String {
    match stage {
        Stage::FieldValidation => format!("Row {} ({}): {}", row, identifier, error),
        Stage::ConstraintValidation => {
            format!("Row {} ({}): schema constraint - {}", row, identifier, error)
        }
        Stage::Construction => {
            format!("Row {} ({}): unexpected error - {}", row, identifier, error)
        }
    }
}

/// Lead-in text, a blank line, then the description
///
/// Returns the description unchanged when the lead-in is blank, and just the
/// lead-in when the description is blank.
pub fn compose_description(lead_in: &str, description: &str) -> String {
    let lead_in = lead_in.trim();
    if lead_in.is_empty() {
        return description.to_string();
    }
    let description = description.trim();
    if description.is_empty() {
        lead_in.to_string()
    } else {
        format!("{}\n\n{}", lead_in, description)
    }
}

/// Combine outcomes, in input order, into a feed
///
/// Every rejected outcome becomes exactly one error entry, so
/// `processed + skipped + inactive == total` holds for the result.
pub fn fold_outcomes<I>(outcomes: I) -> Feed
where
    I: IntoIterator<Item = RecordOutcome>,
{
    let mut feed = Feed::default();

    for outcome in outcomes {
        feed.stats.total_records += 1;
        match outcome {
            RecordOutcome::Inactive => feed.stats.inactive_count += 1,
            RecordOutcome::Built(listing) => {
                feed.stats.processed_count += 1;
                feed.listings.push(listing);
            }
            RecordOutcome::Rejected {
                identifier,
                row,
                stage,
                error,
            } => {
                let reason = rejection_reason(row, &identifier, stage, &error);
                warn!(vendor_id = %identifier, %reason, "record skipped");
                feed.stats.skipped_count += 1;
                feed.stats.errors.push(SkippedRecord {
                    vendor_id: identifier,
                    reason,
                });
            }
        }
    }

    info!(
        processed = feed.stats.processed_count,
        skipped = feed.stats.skipped_count,
        inactive = feed.stats.inactive_count,
        total = feed.stats.total_records,
        "feed assembled"
    );
    feed
}

/// Builds a feed from a batch of records
#[derive(Debug)]
pub struct FeedAssembler<'a> {
    config: &'a FeedConfig,
    formatter: TextFormatter,
}

impl<'a> FeedAssembler<'a> {
    pub fn new(config: &'a FeedConfig) -> Self {
        Self {
            config,
            formatter: TextFormatter::new(),
        }
    }

    /// Process the whole batch
    ///
    /// The feed, the skip warnings and the summary are identical whether or
    /// not `config.parallel` is set. Per-record trace events (tag
    /// replacements, inactive records) are emitted from the worker that
    /// handles the record, so their relative order is only fixed when
    /// running sequentially.
    pub fn assemble(&self, records: &[Record]) -> Feed {
        let outcomes: Vec<RecordOutcome> = if self.config.parallel {
            records
                .par_iter()
                .enumerate()
                .map(|(position, record)| self.process_record(position, record))
                .collect()
        } else {
            records
                .iter()
                .enumerate()
                .map(|(position, record)| self.process_record(position, record))
                .collect()
        };

        fold_outcomes(outcomes)
    }

    /// Run one record through every stage
    ///
    /// `position` is the 0-based index of the record in the batch.
    pub fn process_record(&self, position: usize, record: &Record) -> RecordOutcome {
        let schema = &self.config.schema;
        let row = position + self.config.first_data_row;
        let identifier = match record.text(VENDOR_ID_COLUMN) {
            id if id.is_empty() => format!("ROW-{}", row),
            id => id,
        };

        let active = record
            .get(&schema.active_column)
            .map(|v| v.as_raw_string())
            .unwrap_or_default();
        if !schema.is_active_token(&active) {
            debug!(row, vendor_id = %identifier, "inactive record skipped");
            return RecordOutcome::Inactive;
        }

        let reject = |stage: Stage, error: RecordError| RecordOutcome::Rejected {
            identifier: identifier.clone(),
            row,
            stage,
            error,
        };

        let substitution = TagSubstitutionEngine::new(
            &schema.tags,
            &schema.substituted_fields,
            &self.config.currency,
        )
        .substitute(record);
        if !substitution.trace.is_empty() {
            info!(
                vendor_id = %identifier,
                replacements = %substitution.describe_trace(),
                "tag replacements"
            );
        }
        let record = &substitution.record;

        if let Err(error) = FieldValidator::new(&schema.required_fields).validate(record) {
            return reject(Stage::FieldValidation, error);
        }

        let checked = match ConstraintValidator::new(self.config.vendor_id_max_length).validate(record) {
            Ok(checked) => checked,
            Err(error) => return reject(Stage::ConstraintValidation, error),
        };

        match self.build_listing(record, checked) {
            Ok(listing) => RecordOutcome::Built(listing),
            Err(error) => reject(Stage::Construction, error),
        }
    }

    fn build_listing(&self, record: &Record, checked: CheckedFields) -> Result<Listing, RecordError> {
        let schema = &self.config.schema;
        let extractor = AttributeAndMediaExtractor::new(schema);

        let lead_in = record
            .get(&schema.lead_in_column)
            .map(|v| v.as_raw_string())
            .unwrap_or_default();
        let description_source = record
            .get(DESCRIPTION_COLUMN)
            .map(|v| v.as_raw_string())
            .unwrap_or_default();
        if !lead_in.trim().is_empty() {
            debug!(vendor_id = %record.text(VENDOR_ID_COLUMN), "lead-in prepended to description");
        }
        let description = self
            .formatter
            .format(&compose_description(&lead_in, &description_source));

        let extracted = extractor.extract(record);

        Listing::new(
            ListingParts {
                vendor_id: record.text(VENDOR_ID_COLUMN),
                title: record.text(TITLE_COLUMN),
                description,
                category_id: checked.category_id,
                price_type: checked.price_type,
                price: resolve_price(record.get(PRICE_COLUMN), checked.price_type),
                url: extractor.url(record),
                images: extracted.images,
                attributes: extracted.attributes,
            },
            self.config.vendor_id_max_length,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PriceType;
    use crate::error::ErrorKind;

    fn active(vendor_id: &str) -> Record {
        Record::new()
            .field("Available", "TRUE")
            .field("vendorId", vendor_id)
            .field("title", "Flat")
            .field("description", "Nice")
            .field("categoryId", "5")
            .field("priceType", "free")
    }

    #[test]
    fn test_compose_description() {
        assert_eq!(compose_description("", "Body"), "Body");
        assert_eq!(compose_description("  ", "Body"), "Body");
        assert_eq!(compose_description("Lead", "Body "), "Lead\n\nBody");
        assert_eq!(compose_description(" Lead ", "   "), "Lead");
    }

    #[test]
    fn test_minimal_record_builds_listing() {
        let config = FeedConfig::default();
        let outcome = FeedAssembler::new(&config).process_record(0, &active("V1"));
        match outcome {
            RecordOutcome::Built(listing) => {
                assert_eq!(listing.vendor_id(), "V1");
                assert_eq!(listing.description(), "<p>Nice</p>");
                assert_eq!(listing.price_type(), PriceType::Free);
                assert_eq!(listing.price(), 0);
                assert!(listing.images().is_empty());
                assert!(listing.attributes().is_empty());
                assert_eq!(listing.url(), None);
            }
            other => panic!("Expected Built, got {:?}", other),
        }
    }

    #[test]
    fn test_inactive_record() {
        let config = FeedConfig::default();
        let assembler = FeedAssembler::new(&config);
        assert_eq!(
            assembler.process_record(0, &active("V1").with("Available", "NO")),
            RecordOutcome::Inactive
        );
        let no_flag: Record = active("V1")
            .iter()
            .filter(|(k, _)| k.as_str() != "Available")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(assembler.process_record(0, &no_flag), RecordOutcome::Inactive);
    }

    #[test]
    fn test_active_flag_accepts_bool_and_number() {
        let config = FeedConfig::default();
        let assembler = FeedAssembler::new(&config);
        assert!(matches!(
            assembler.process_record(0, &active("V1").with("Available", true)),
            RecordOutcome::Built(_)
        ));
        assert!(matches!(
            assembler.process_record(0, &active("V1").with("Available", 1i64)),
            RecordOutcome::Built(_)
        ));
    }

    #[test]
    fn test_rejection_reason_formats() {
        let config = FeedConfig::default();
        let assembler = FeedAssembler::new(&config);

        let missing = assembler.process_record(3, &active("V9").with("title", ""));
        assert_eq!(
            missing.reason().as_deref(),
            Some("Row 5 (V9): missing required field 'title'")
        );

        let constraint = assembler.process_record(0, &active("V2").with("categoryId", "abc"));
        assert_eq!(
            constraint.reason().as_deref(),
            Some("Row 2 (V2): schema constraint - invalid categoryId: 'abc'")
        );
    }

    #[test]
    fn test_missing_vendor_id_uses_row_identifier() {
        let config = FeedConfig::default();
        let outcome = FeedAssembler::new(&config).process_record(4, &active(""));
        match outcome {
            RecordOutcome::Rejected {
                identifier, error, ..
            } => {
                assert_eq!(identifier, "ROW-6");
                assert_eq!(error.kind(), ErrorKind::MissingField);
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_field_filled_by_substitution_counts_as_present() {
        let config = FeedConfig::default();
        let record = active("V1")
            .with("title", "{{center_name}}")
            .with("center_name", "Loft Central");
        match FeedAssembler::new(&config).process_record(0, &record) {
            RecordOutcome::Built(listing) => assert_eq!(listing.title(), "Loft Central"),
            other => panic!("Expected Built, got {:?}", other),
        }
    }

    #[test]
    fn test_field_emptied_by_substitution_is_missing() {
        let config = FeedConfig::default();
        let record = active("V1").with("title", "{{center_name}}");
        assert!(matches!(
            FeedAssembler::new(&config).process_record(0, &record),
            RecordOutcome::Rejected {
                stage: Stage::FieldValidation,
                ..
            }
        ));
    }

    #[test]
    fn test_lead_in_prepended_after_substitution() {
        let config = FeedConfig::default();
        let record = active("V1")
            .with("preheader", "Only {{currency}} 900")
            .with("description", "Spacious\nand bright");
        match FeedAssembler::new(&config).process_record(0, &record) {
            RecordOutcome::Built(listing) => assert_eq!(
                listing.description(),
                "<p>Only EUR 900</p><p>Spacious<br>and bright</p>"
            ),
            other => panic!("Expected Built, got {:?}", other),
        }
    }

    #[test]
    fn test_fold_counts_and_order() {
        let config = FeedConfig::default();
        let records = vec![
            active("A"),
            active("B").with("Available", "no"),
            active("C").with("priceType", "cheap"),
            active("D"),
            active("E").with("categoryId", "-1"),
        ];
        let feed = FeedAssembler::new(&config).assemble(&records);

        assert_eq!(feed.stats.total_records, 5);
        assert_eq!(feed.stats.processed_count, 2);
        assert_eq!(feed.stats.skipped_count, 2);
        assert_eq!(feed.stats.inactive_count, 1);
        let ids: Vec<&str> = feed.listings.iter().map(|l| l.vendor_id()).collect();
        assert_eq!(ids, vec!["A", "D"]);
        let error_ids: Vec<&str> = feed.stats.errors.iter().map(|e| e.vendor_id.as_str()).collect();
        assert_eq!(error_ids, vec!["C", "E"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let records: Vec<Record> = (0..200)
            .map(|i| {
                let record = active(&format!("V{}", i));
                match i % 4 {
                    0 => record.with("Available", "no"),
                    1 => record.with("categoryId", "x"),
                    _ => record,
                }
            })
            .collect();

        let sequential = FeedConfig::default();
        let parallel = FeedConfig {
            parallel: true,
            ..FeedConfig::default()
        };
        assert_eq!(
            FeedAssembler::new(&sequential).assemble(&records),
            FeedAssembler::new(&parallel).assemble(&records)
        );
    }

    #[test]
    fn test_construction_failure_is_recorded_not_fatal() {
        let config = FeedConfig::default();
        let assembler = FeedAssembler::new(&config);
        let record = active("V1");
        let outcome = assembler.process_record(0, &record);
        assert!(matches!(outcome, RecordOutcome::Built(_)));

        let failing = RecordOutcome::Rejected {
            identifier: "V1".to_string(),
            row: 2,
            stage: Stage::Construction,
            error: RecordError::unexpected("boom"),
        };
        let feed = fold_outcomes(vec![failing, outcome]);
        assert_eq!(feed.stats.skipped_count, 1);
        assert_eq!(feed.stats.processed_count, 1);
        assert_eq!(
            feed.stats.errors[0].reason,
            "Row 2 (V1): unexpected error - boom"
        );
    }

    #[test]
    fn test_fold_reason_matches_outcome_reason() {
        let config = FeedConfig::default();
        let assembler = FeedAssembler::new(&config);
        let outcome = assembler.process_record(1, &active("V7").with("title", "Flat\u{c} deal"));
        let expected = outcome.reason();

        assert!(matches!(
            outcome,
            RecordOutcome::Rejected {
                stage: Stage::Construction,
                ..
            }
        ));
        let feed = fold_outcomes(vec![outcome]);
        assert_eq!(Some(feed.stats.errors[0].reason.clone()), expected);
        assert_eq!(
            feed.stats.errors[0].reason,
            "Row 3 (V7): unexpected error - title contains character U+000C not allowed in XML"
        );
    }
}
