//! Boolean coercion
//!
//! Sites express flags as checkmark icons, `"true"`, `1`, empty cells or not
//! at all. Everything collapses to a plain `bool`: only an explicit true
//! value, `1` or a present-marker count as `true`.

use crate::record::FieldValue;
use serde_json::Value;

/// Coerces an extracted value to a boolean
pub fn truthy(value: Option<&FieldValue>) -> bool {
    match value {
        Some(FieldValue::Flag(flag)) => *flag,
        Some(FieldValue::Text(text)) => truthy_str(text),
        None => false,
    }
}

/// Coerces a JSON value to a boolean
///
/// Used on documents from snapshots that may predate normalization.
pub fn truthy_json(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(text) => truthy_str(text),
        _ => false,
    }
}

fn truthy_str(text: &str) -> bool {
    let text = text.trim();
    text == "1" || text.eq_ignore_ascii_case("true")
}
