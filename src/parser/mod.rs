//! Parser Module
//!
//! Record sources. Both readers produce the same ordered [`Record`] rows,
//! so the pipeline does not care where the data came from.
//!
//! [`Record`]: crate::types::Record

mod json;
mod workbook;

pub use json::read_json_records;
pub use workbook::WorkbookReader;
