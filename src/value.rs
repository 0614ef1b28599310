//! Conversion from marshaled row values to positional arguments.

use sea_query::Value;

/// Convert one JSON row value into a query argument.
///
/// Scalars map onto the matching [`Value`] variant; arrays and objects are
/// passed as [`Value::Json`]. `null` becomes a typeless null.
pub fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::String(None),
        serde_json::Value::Bool(b) => Value::Bool(Some(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::BigInt(Some(i))
            } else if let Some(u) = n.as_u64() {
                Value::BigUnsigned(Some(u))
            } else {
                Value::Double(n.as_f64())
            }
        }
        serde_json::Value::String(s) => Value::String(Some(s)),
        other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
            Value::Json(Some(Box::new(other)))
        }
    }
}

/// Whether `json` holds the zero value of its type: `null`, `false`, `0` or `""`.
///
/// Arrays and objects are never zero.
pub fn is_zero(json: &serde_json::Value) -> bool {
    match json {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => false,
    }
}
