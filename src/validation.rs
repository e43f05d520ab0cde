//! Validation Module
//!
//! Two stages run on the substituted record, in this order:
//!
//! 1. [`FieldValidator`] - required fields are present and not blank.
//! 2. [`ConstraintValidator`] - values satisfy the fixed feed schema rules.
//!
//! Both stop at the first failure.

use crate::api::PriceType;
use crate::error::RecordError;
use crate::schema::{CATEGORY_COLUMN, PRICE_TYPE_COLUMN, VENDOR_ID_COLUMN};
use crate::types::Record;

/// Required-field check
#[derive(Debug, Clone, Copy)]
pub struct FieldValidator<'a> {
    required: &'a [String],
}

impl<'a> FieldValidator<'a> {
    pub fn new(required: &'a [String]) -> Self {
        Self { required }
    }

    /// Report the first required field, in table order, that is missing
    pub fn validate(&self, record: &Record) -> Result<(), RecordError> {
        match self.required.iter().find(|field| !record.is_present(field)) {
            Some(field) => Err(RecordError::MissingField {
                field: field.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Values extracted while checking the schema constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedFields {
    pub price_type: PriceType,
    pub category_id: u64,
}

/// Schema constraint check: vendorId length, then priceType, then categoryId
#[derive(Debug, Clone, Copy)]
pub struct ConstraintValidator {
    vendor_id_max_length: usize,
}

impl ConstraintValidator {
    pub fn new(vendor_id_max_length: usize) -> Self {
        Self {
            vendor_id_max_length,
        }
    }

    pub fn validate(&self, record: &Record) -> Result<CheckedFields, RecordError> {
        self.check_vendor_id(record)?;
        let price_type = Self::check_price_type(record)?;
        let category_id = Self::check_category(record)?;

        Ok(CheckedFields {
            price_type,
            category_id,
        })
    }

    fn check_vendor_id(&self, record: &Record) -> Result<(), RecordError> {
        let length = record.text(VENDOR_ID_COLUMN).chars().count();
        if length > self.vendor_id_max_length {
            return Err(RecordError::VendorIdTooLong {
                actual: length,
                limit: self.vendor_id_max_length,
            });
        }
        Ok(())
    }

    fn check_price_type(record: &Record) -> Result<PriceType, RecordError> {
        let raw = record.text(PRICE_TYPE_COLUMN);
        raw.parse::<PriceType>()
            .map_err(|unknown| RecordError::InvalidPriceType { value: unknown.0 })
    }

    fn check_category(record: &Record) -> Result<u64, RecordError> {
        let value = record.get(CATEGORY_COLUMN).cloned().unwrap_or_default();
        let category = value
            .as_truncated_int()
            .ok_or_else(|| RecordError::InvalidCategory {
                raw: value.as_raw_string(),
            })?;

        if category <= 0 {
            return Err(RecordError::NonPositiveCategory { value: category });
        }
        Ok(category as u64)
    }
}
