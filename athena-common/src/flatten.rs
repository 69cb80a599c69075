//! Recursive flattening of arbitrary JSON into a flat table
//!
//! Objects are folded into joined key paths (`a.b` becomes `a_b`) and lists
//! are expanded into repeated rows. Expansion is transitive: an exploded
//! element may expose further objects and lists, which are processed on the
//! following passes.
//!
//! # Explosion policy
//!
//! Each pass explodes exactly one column: the first column, in first-seen
//! column order, that holds a list in any row. Every row whose cell is a list
//! is replaced by one row per element, in element order. An empty list leaves
//! a single row with `null` in that column. Rows holding a scalar or lacking
//! the column are kept unchanged. Sibling lists of different lengths on the
//! same row therefore multiply out (cartesian product) regardless of their
//! lengths.
//!
//! This output is for inspecting payload shapes. Priced line items are built
//! by the schema-aware extractors in [`crate::extract`].

use crate::tabular::Tabular;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Default key-path separator
pub const DEFAULT_SEPARATOR: &str = "_";

/// Column name used for rows built from non-object values
pub const SCALAR_COLUMN: &str = "value";

/// One flat row: key path to scalar
pub type FlatRecord = Map<String, Value>;

/// Ordered flat rows sharing a possibly sparse column set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlatTable {
    records: Vec<FlatRecord>,
}

impl FlatTable {
    pub fn records(&self) -> &[FlatRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one column, `None` for rows lacking it
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Option<&'a Value>> + 'a {
        self.records.iter().map(move |r| r.get(name))
    }
}

impl Tabular for FlatTable {
    fn columns(&self) -> Vec<String> {
        column_order(&self.records)
    }

    fn rows(&self) -> Vec<Vec<Value>> {
        let columns = self.columns();
        self.records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect()
    }
}

/// Flattening settings and sanity bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flattener {
    /// Joins parent and child keys
    pub separator: String,
    /// Deepest object/list nesting accepted
    pub max_depth: usize,
    /// Most explosion passes before giving up
    pub max_passes: usize,
    /// Most output rows before giving up
    pub max_rows: usize,
}

impl Default for Flattener {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            max_depth: 64,
            max_passes: 10_000,
            max_rows: 1_000_000,
        }
    }
}

/// Flatten with default bounds and the given separator
pub fn flatten(raw: &Value, separator: &str) -> Result<FlatTable> {
    Flattener {
        separator: separator.to_string(),
        ..Flattener::default()
    }
    .flatten(raw)
}

impl Flattener {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            ..Self::default()
        }
    }

    /// Flatten `raw` into a table with no list or object cells
    ///
    /// # Errors
    /// [`Error::MalformedPayload`] when nesting exceeds `max_depth`, or the
    /// expansion needs more than `max_passes` passes or `max_rows` rows.
    pub fn flatten(&self, raw: &Value) -> Result<FlatTable> {
        if raw.is_null() {
            return Ok(FlatTable::default());
        }

        if exceeds_depth(raw, 0, self.max_depth) {
            return Err(Error::MalformedPayload(format!(
                "nesting deeper than {} levels",
                self.max_depth
            )));
        }

        let mut records: Vec<FlatRecord> = match raw {
            Value::Array(items) => items.iter().map(|item| self.normalize(item)).collect(),
            other => vec![self.normalize(other)],
        };
        self.check_rows(records.len())?;

        let mut passes = 0;
        while let Some(column) = first_list_column(&records) {
            if passes >= self.max_passes {
                return Err(Error::MalformedPayload(format!(
                    "list expansion did not settle after {} passes",
                    self.max_passes
                )));
            }
            passes += 1;
            debug!(column = %column, rows = records.len(), pass = passes, "Exploding list column");
            records = self.explode(records, &column)?;
        }

        Ok(FlatTable { records })
    }

    /// One record from one value
    fn normalize(&self, value: &Value) -> FlatRecord {
        let mut record = FlatRecord::new();
        match value {
            Value::Object(map) => self.fold_into(&mut record, None, map),
            other => {
                record.insert(SCALAR_COLUMN.to_string(), other.clone());
            }
        }
        record
    }

    /// Fold an object into `record` under `prefix`; lists are kept for later passes
    fn fold_into(&self, record: &mut FlatRecord, prefix: Option<&str>, map: &Map<String, Value>) {
        for (key, value) in map {
            let path = match prefix {
                Some(p) => format!("{}{}{}", p, self.separator, key),
                None => key.clone(),
            };
            match value {
                Value::Object(inner) if !inner.is_empty() => {
                    self.fold_into(record, Some(&path), inner)
                }
                Value::Object(_) => {
                    record.insert(path, Value::Null);
                }
                other => {
                    record.insert(path, other.clone());
                }
            }
        }
    }

    fn explode(&self, records: Vec<FlatRecord>, column: &str) -> Result<Vec<FlatRecord>> {
        let mut out = Vec::with_capacity(records.len());

        for mut record in records {
            let items = match record.get_mut(column) {
                Some(Value::Array(items)) => Some(std::mem::take(items)),
                _ => None,
            };
            let Some(items) = items else {
                out.push(record);
                continue;
            };

            if items.is_empty() {
                record.insert(column.to_string(), Value::Null);
                out.push(record);
            } else {
                for item in items {
                    out.push(self.place(&record, column, item));
                }
            }
            self.check_rows(out.len())?;
        }

        Ok(out)
    }

    /// Copy of `record` with `column` replaced by `item`, keeping column position
    fn place(&self, record: &FlatRecord, column: &str, item: Value) -> FlatRecord {
        let mut placed = FlatRecord::new();
        for (key, value) in record {
            if key != column {
                placed.insert(key.clone(), value.clone());
                continue;
            }
            match &item {
                Value::Object(map) if !map.is_empty() => {
                    self.fold_into(&mut placed, Some(column), map)
                }
                Value::Object(_) => {
                    placed.insert(key.clone(), Value::Null);
                }
                other => {
                    placed.insert(key.clone(), other.clone());
                }
            }
        }
        placed
    }

    fn check_rows(&self, rows: usize) -> Result<()> {
        if rows > self.max_rows {
            return Err(Error::MalformedPayload(format!(
                "expansion exceeds {} rows",
                self.max_rows
            )));
        }
        Ok(())
    }
}

fn exceeds_depth(value: &Value, depth: usize, max_depth: usize) -> bool {
    let mut children: Box<dyn Iterator<Item = &Value>> = match value {
        Value::Array(items) => Box::new(items.iter()),
        Value::Object(map) => Box::new(map.values()),
        _ => return false,
    };
    if depth >= max_depth {
        return true;
    }
    children.any(|child| exceeds_depth(child, depth + 1, max_depth))
}

/// Union of record keys in first-seen order
fn column_order(records: &[FlatRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn first_list_column(records: &[FlatRecord]) -> Option<String> {
    column_order(records)
        .into_iter()
        .find(|column| records.iter().any(|r| matches!(r.get(column), Some(Value::Array(_)))))
}
