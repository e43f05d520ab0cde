//! Fallback Module
//!
//! Numeric coercion with safe minimums. Neither function fails: bad input
//! turns into the smallest value the feed accepts.

use crate::api::PriceType;
use crate::types::Value;

/// Area attribute value
///
/// Parsed as a real number and truncated toward zero. Unparseable or
/// non-positive input yields `"1"`.
pub fn resolve_area(raw: &str) -> String {
    match Value::Text(raw.to_string()).as_truncated_int() {
        Some(area) if area > 0 => area.to_string(),
        _ => "1".to_string(),
    }
}

/// Price written to the feed
///
/// For price types that require a price the truncated value is used, with a
/// floor of `1` when it is missing, unparseable or non-positive. Every other
/// price type always gets `0`, whatever the input says.
pub fn resolve_price(raw: Option<&Value>, price_type: PriceType) -> u64 {
    if !price_type.requires_price() {
        return 0;
    }
    match raw.and_then(Value::as_truncated_int) {
        Some(price) if price > 0 => price as u64,
        _ => 1,
    }
}
