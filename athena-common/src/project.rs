//! Well enumeration from a project lookup payload

use crate::payload::{scalar_text, PayloadExt};
use serde_json::Value;
use std::collections::HashSet;

/// Key of the well list inside a project record
pub const WELL_IDS_KEY: &str = "wellIDs";

/// Well identifiers referenced by a project payload
///
/// The payload is one project record or a list of them. Every element of every
/// `wellIDs` list contributes its `id`, rendered as a string so that numeric
/// and textual ids group the same way downstream. Elements without an id are
/// skipped; duplicates keep their first position.
pub fn well_ids(project: &Value) -> Vec<String> {
    let records: Vec<&Value> = match project {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter_map(|record| record.list(WELL_IDS_KEY))
        .flatten()
        .filter_map(well_id)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// A `wellIDs` element is either `{"id": ...}` or the bare id itself
fn well_id(element: &Value) -> Option<String> {
    match element {
        Value::Object(_) => element.text("id"),
        other => scalar_text(other),
    }
    .filter(|id| !id.trim().is_empty())
}
