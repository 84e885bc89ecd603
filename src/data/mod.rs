//! Tabular data model
//!
//! A [`Table`] is an ordered list of column names plus rows of [`Value`]
//! cells. Every row carries exactly one cell per column, in column order;
//! cells absent from the source are stored as [`Value::Missing`].

pub mod loader;
pub mod matrix;

pub use loader::load_csv;
pub use matrix::{extract_features, extract_matrix, FeatureData};

use crate::error::{Result, TabulaError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A single scalar cell.
///
/// Equality compares numbers bitwise, so a NaN cell equals an identical NaN
/// cell and tables holding NaN still compare equal to themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit missing marker (serialised as `null`)
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Build a cell from raw text; blank text is treated as missing
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Value::Missing
        } else {
            Value::Text(s.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric reading of the cell.
    ///
    /// Numbers are returned as-is, booleans map to 1/0 and text is parsed
    /// after trimming. Non-finite results count as non-numeric.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Value::Missing => return None,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }

    /// Canonical text key, used for uniqueness counts and encoding dictionaries
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits() || a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::from_text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Value::Missing, Value::Number)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Missing,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Missing, Value::Number),
            serde_json::Value::String(s) => Value::from_text(s),
            other => Value::Text(other.to_string()),
        }
    }
}

/// Ordered, row-uniform table of heterogeneous values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table, checking the row-uniformity invariant
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TabulaError::DataError(format!(
                    "Duplicate column name '{}'",
                    name
                )));
            }
        }

        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(TabulaError::ShapeError {
                expected: format!("{} cells per row", columns.len()),
                actual: format!("{} cells in row {}", row.len(), idx),
            });
        }

        Ok(Self { columns, rows })
    }

    /// Build a table from JSON-style records.
    ///
    /// Columns appear in first-seen key order; a key absent from a record
    /// becomes [`Value::Missing`] in that row.
    pub fn from_records(records: &[serde_json::Map<String, serde_json::Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|name| record.get(name).map_or(Value::Missing, Value::from))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of a column, or `ColumnNotFound`
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| TabulaError::ColumnNotFound(name.to_string()))
    }

    /// Iterate the cells of one column
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Cell lookup by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// New table holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// First `n` rows, used for previews
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Append a derived column, replacing an existing column of the same name
    pub(crate) fn put_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
    }

    /// Overwrite cells of one column
    pub(crate) fn set_cell(&mut self, row: usize, col: usize, value: Value) {
        self.rows[row][col] = value;
    }

    /// Remove named columns from the header and every row
    pub(crate) fn drop_columns(&mut self, names: &[String]) -> Vec<String> {
        let mut removed_idx: Vec<usize> = names
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        removed_idx.sort_unstable();
        removed_idx.dedup();

        let removed: Vec<String> = removed_idx.iter().map(|&i| self.columns[i].clone()).collect();
        for &idx in removed_idx.iter().rev() {
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
        removed
    }

    /// Keep only rows for which `keep` returns true; returns the number removed
    pub(crate) fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[Value]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nan_cells_compare_equal() {
        assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));
        assert_ne!(Value::Number(1.0), Value::Text("1".into()));
        assert_ne!(Value::Missing, Value::Number(f64::NAN));
    }

    fn records(value: serde_json::Value) -> Vec<serde_json::Map<String, serde_json::Value>> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_value_numeric_reading() {
        assert_eq!(Value::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Text(" 3 ".into()).as_f64(), Some(3.0));
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Value::Text("abc".into()).as_f64(), None);
        assert_eq!(Value::Text("NaN".into()).as_f64(), None);
        assert_eq!(Value::Missing.as_f64(), None);
        assert_eq!(Value::from_text("  "), Value::Missing);
    }

    #[test]
    fn test_from_records_fills_absent_cells() {
        let table = Table::from_records(&records(json!([
            {"a": 1, "b": "x"},
            {"a": 2},
            {"b": "y", "c": true}
        ])));

        assert_eq!(table.columns(), &["a", "b", "c"]);
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.get(1, "b"), Some(&Value::Missing));
        assert_eq!(table.get(2, "a"), Some(&Value::Missing));
        assert_eq!(table.get(2, "c"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let err = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![Value::Number(1.0)]],
        )
        .unwrap_err();
        assert!(matches!(err, TabulaError::ShapeError { .. }));
    }

    #[test]
    fn test_drop_and_put_columns() {
        let mut table = Table::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![Value::Number(1.0), Value::from("x")],
                vec![Value::Number(2.0), Value::from("y")],
            ],
        )
        .unwrap();

        table.put_column("c", vec![Value::Bool(true), Value::Bool(false)]);
        let removed = table.drop_columns(&["a".to_string(), "zzz".to_string()]);

        assert_eq!(removed, vec!["a".to_string()]);
        assert_eq!(table.columns(), &["b", "c"]);
        assert_eq!(table.rows()[1], vec![Value::from("y"), Value::Bool(false)]);
    }

    #[test]
    fn test_value_serde_roundtrip_uses_plain_json() {
        let row = vec![
            Value::Missing,
            Value::Bool(false),
            Value::Number(1.5),
            Value::Text("hi".into()),
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,false,1.5,"hi"]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
