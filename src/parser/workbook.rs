//! Workbook Reader
//!
//! Reads spreadsheet rows through calamine. The first row of the selected
//! sheet is the header; every following row becomes one record.

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use std::io::{Cursor, Read, Seek};
use tracing::debug;

use crate::api::SheetSelector;
use crate::error::FeedError;
use crate::security::SecurityConfig;
use crate::types::{Record, Value};

/// Spreadsheet record source
///
/// Any format calamine detects (xlsx, xlsm, xlsb, xls, ods) is accepted.
pub struct WorkbookReader<RS: Read + Seek> {
    workbook: Sheets<RS>,
}

impl WorkbookReader<Cursor<Vec<u8>>> {
    /// Load the whole input into memory and open it
    ///
    /// # Errors
    ///
    /// - `FeedError::SecurityViolation` when the input exceeds the size limit
    /// - `FeedError::Parse` when calamine cannot open the workbook
    pub fn open<R: Read>(mut reader: R, security: &SecurityConfig) -> Result<Self, FeedError> {
        let mut buffer = Vec::new();
        let bytes_read = reader.read_to_end(&mut buffer)?;
        security.check_input_size(bytes_read)?;

        let workbook = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        Ok(Self { workbook })
    }
}

impl<RS: Read + Seek> WorkbookReader<RS> {
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// Resolve a selector to a sheet name
    pub fn select_sheet(&self, selector: &SheetSelector) -> Result<String, FeedError> {
        let all_sheet_names = self.sheet_names();

        match selector {
            SheetSelector::Index(index) => all_sheet_names.get(*index).cloned().ok_or_else(|| {
                FeedError::Config(format!(
                    "Sheet index {} is out of range (total: {})",
                    index,
                    all_sheet_names.len()
                ))
            }),
            SheetSelector::Name(name) => {
                if !all_sheet_names.contains(name) {
                    return Err(FeedError::Config(format!("Sheet '{}' not found", name)));
                }
                Ok(name.clone())
            }
        }
    }

    /// Read the selected sheet as records
    ///
    /// Header cells are trimmed; columns with a blank header are ignored.
    /// An empty sheet yields no records.
    pub fn read_records(&mut self, selector: &SheetSelector) -> Result<Vec<Record>, FeedError> {
        let sheet_name = self.select_sheet(selector)?;
        let range = self.workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let headers: Vec<Option<String>> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| {
                    let header = cell_value(cell).as_raw_string().trim().to_string();
                    (!header.is_empty()).then_some(header)
                })
                .collect(),
            None => return Ok(Vec::new()),
        };

        let records: Vec<Record> = rows
            .map(|row| {
                headers
                    .iter()
                    .zip(row)
                    .filter_map(|(header, cell)| {
                        header.as_ref().map(|h| (h.clone(), cell_value(cell)))
                    })
                    .collect()
            })
            .collect();

        debug!(sheet = %sheet_name, rows = records.len(), "worksheet read");
        Ok(records)
    }
}

/// Map a calamine cell to a record value
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) => Value::Number(*f),
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::Empty | Data::Error(_) => Value::Empty,
        other => Value::Text(other.to_string()),
    }
}
