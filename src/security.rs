//! Security Module
//!
//! Input limits applied before any record is processed.

use crate::error::FeedError;

/// Resource limits for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Maximum input size in bytes
    pub max_input_file_size: u64,

    /// Maximum number of records in one batch
    pub max_record_count: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_file_size: 268_435_456, // 256MB
            max_record_count: 1_000_000,
        }
    }
}

impl SecurityConfig {
    pub(crate) fn check_input_size(&self, bytes: usize) -> Result<(), FeedError> {
        if bytes as u64 > self.max_input_file_size {
            return Err(FeedError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                bytes, self.max_input_file_size
            )));
        }
        Ok(())
    }

    pub(crate) fn check_record_count(&self, count: usize) -> Result<(), FeedError> {
        if count > self.max_record_count {
            return Err(FeedError::SecurityViolation(format!(
                "Record count exceeds maximum: {} (max: {})",
                count, self.max_record_count
            )));
        }
        Ok(())
    }
}
