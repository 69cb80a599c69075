//! Safe-get accessors over raw JSON payloads
//!
//! Upstream resources return JSON of loosely agreed shape. Every lookup here
//! yields `None` instead of failing, and a key that is present with a `null`
//! value is treated exactly like a missing key.

use serde_json::Value;

/// Optional-returning accessors for `serde_json::Value`
pub trait PayloadExt {
    /// Value under `key`, or `None` when self is not an object, the key is
    /// missing, or the value is `null`
    fn field(&self, key: &str) -> Option<&Value>;

    /// Follow a chain of object keys (e.g. `["measurementUnits", "label"]`)
    fn path(&self, keys: &[&str]) -> Option<&Value>;

    /// Field rendered as text (see [`scalar_text`])
    fn text(&self, key: &str) -> Option<String>;

    /// Field as a list, `None` when missing or not a list
    fn list(&self, key: &str) -> Option<&Vec<Value>>;
}

impl PayloadExt for Value {
    fn field(&self, key: &str) -> Option<&Value> {
        match self.as_object()?.get(key)? {
            Value::Null => None,
            value => Some(value),
        }
    }

    fn path(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().try_fold(self, |current, key| current.field(key))
    }

    fn text(&self, key: &str) -> Option<String> {
        self.field(key).and_then(scalar_text)
    }

    fn list(&self, key: &str) -> Option<&Vec<Value>> {
        self.field(key)?.as_array()
    }
}

/// Render a scalar as text
///
/// Strings are returned as is; numbers and booleans use their JSON text.
/// `null`, lists and objects have no text form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
