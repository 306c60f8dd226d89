//! Attribute value coercion helpers.
//!
//! # Responsibility
//! - Define the truthy/falsy rule used by derived boolean properties.
//!
//! # Invariants
//! - `Null`, `false`, numeric zero and the empty string are falsy.
//! - Every other value is truthy, including empty arrays and objects.

use serde_json::Value;

/// Shared `Null` returned for attributes that were never assigned.
pub(crate) static NULL: Value = Value::Null;

/// Returns whether `value` coerces to `true`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
