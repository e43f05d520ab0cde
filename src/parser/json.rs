//! JSON Record Reader
//!
//! Reads a JSON array of flat objects. Object key order is kept, so columns
//! come out in document order.

use serde_json::Value as JsonValue;
use std::io::Read;

use crate::error::FeedError;
use crate::security::SecurityConfig;
use crate::types::{Record, Value};

/// Read records from a JSON document
///
/// Values may be `null`, booleans, numbers or strings.
///
/// # Errors
///
/// - `FeedError::Json` when the document is not valid JSON
/// - `FeedError::InvalidInput` when it is not an array of flat objects
/// - `FeedError::SecurityViolation` when the input exceeds the size limit
pub fn read_json_records<R: Read>(
    mut reader: R,
    security: &SecurityConfig,
) -> Result<Vec<Record>, FeedError> {
    let mut buffer = Vec::new();
    let bytes_read = reader.read_to_end(&mut buffer)?;
    security.check_input_size(bytes_read)?;

    let items = match serde_json::from_slice::<JsonValue>(&buffer)? {
        JsonValue::Array(items) => items,
        _ => {
            return Err(FeedError::InvalidInput(
                "expected a JSON array of records".to_string(),
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            JsonValue::Object(map) => map
                .into_iter()
                .map(|(key, value)| {
                    let value = json_value(value).ok_or_else(|| {
                        FeedError::InvalidInput(format!(
                            "record {}: field '{}' is not a scalar value",
                            index, key
                        ))
                    })?;
                    Ok((key, value))
                })
                .collect::<Result<Record, FeedError>>(),
            _ => Err(FeedError::InvalidInput(format!(
                "record {} is not an object",
                index
            ))),
        })
        .collect()
}

fn json_value(value: JsonValue) -> Option<Value> {
    match value {
        JsonValue::Null => Some(Value::Empty),
        JsonValue::Bool(b) => Some(Value::Bool(b)),
        JsonValue::Number(n) => Some(
            n.as_f64()
                .map(Value::Number)
                .unwrap_or_else(|| Value::Text(n.to_string())),
        ),
        JsonValue::String(s) => Some(Value::Text(s)),
        JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}
