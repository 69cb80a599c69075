//! Best-effort numeric coercion of payload fields

use crate::{Error, Result};
use serde_json::Value;
use tracing::debug;

/// Parse a JSON value as a finite `f64`
///
/// Numbers are taken as is. Strings are trimmed and parsed. Everything else
/// (null, booleans, lists, objects), unparseable strings and non-finite
/// results are a [`Error::CoercionFailure`].
pub fn parse_f64(value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(Error::CoercionFailure(format!("not a number: {}", value))),
    }
}

/// Coerce an optional field to `f64`, substituting `None` on any failure
pub fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    let value = value?;
    match parse_f64(value) {
        Ok(n) => Some(n),
        Err(e) => {
            debug!(error = %e, "Numeric coercion failed, using null");
            None
        }
    }
}
