//! Column/row view shared by every table handed to the display layer

use serde::Serialize;
use serde_json::Value;

/// Ordered records with named columns
pub trait Tabular {
    /// Column names in display order
    fn columns(&self) -> Vec<String>;

    /// Rows aligned to [`Tabular::columns`], `null` where a record lacks a column
    fn rows(&self) -> Vec<Vec<Value>>;
}

/// Serializable snapshot of a [`Tabular`] table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub total_rows: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableView {
    pub fn of<T: Tabular + ?Sized>(table: &T) -> Self {
        let rows = table.rows();
        Self {
            total_rows: rows.len(),
            columns: table.columns(),
            rows,
        }
    }

    /// Render as aligned plain text (header, rule, one line per row)
    pub fn to_text(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let format_line = |values: &[String]| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:<width$}", v, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = String::new();
        out.push_str(&format_line(&self.columns));
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format_line(&rule));
        out.push('\n');
        for row in &cells {
            out.push_str(&format_line(row));
            out.push('\n');
        }
        out
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
