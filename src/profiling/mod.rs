//! Column type inference and statistics

use crate::data::{Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Share of non-missing values that must parse as numbers for a column to be numeric
pub const NUMERIC_THRESHOLD: f64 = 0.8;

/// Number of sample values kept per column
pub const MAX_SAMPLE_VALUES: usize = 5;

/// Inferred column kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Summary of the parseable numeric values of a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Profile of a single column for one table snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub missing_count: usize,
    /// Missing cells as a percentage of all rows
    pub missing_percentage: f64,
    /// Distinct non-missing values
    pub unique_count: usize,
    /// Up to five distinct non-missing values in first-seen order
    pub sample_values: Vec<Value>,
    /// Present for numeric columns with at least one parseable value
    pub numeric_summary: Option<NumericSummary>,
}

impl ColumnProfile {
    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }
}

/// Profile every column of a table.
///
/// An empty table (no rows) yields an empty profile list.
pub fn profile_table(table: &Table) -> Vec<ColumnProfile> {
    if table.is_empty() {
        return Vec::new();
    }

    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| profile_column(name, table.column_values(idx), table.n_rows()))
        .collect()
}

fn profile_column<'a>(
    name: &str,
    values: impl Iterator<Item = &'a Value>,
    n_rows: usize,
) -> ColumnProfile {
    let mut missing_count = 0usize;
    let mut present = 0usize;
    let mut numeric: Vec<f64> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut sample_values = Vec::new();

    for value in values {
        if value.is_missing() {
            missing_count += 1;
            continue;
        }
        present += 1;
        if let Some(v) = value.as_f64() {
            numeric.push(v);
        }
        if seen.insert(value.key()) && sample_values.len() < MAX_SAMPLE_VALUES {
            sample_values.push(value.clone());
        }
    }

    // A column with no values at all has nothing to parse and stays categorical.
    let kind = if present > 0 && numeric.len() as f64 / present as f64 >= NUMERIC_THRESHOLD {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    };

    let numeric_summary = match kind {
        ColumnKind::Numeric => summarize(&numeric),
        ColumnKind::Categorical => None,
    };

    ColumnProfile {
        name: name.to_string(),
        kind,
        missing_count,
        missing_percentage: 100.0 * missing_count as f64 / n_rows.max(1) as f64,
        unique_count: seen.len(),
        sample_values,
        numeric_summary,
    }
}

fn summarize(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    Some(NumericSummary {
        mean,
        std: var.sqrt(),
        min,
        max,
    })
}

/// Look up a profile by column name
pub fn find_profile<'a>(profiles: &'a [ColumnProfile], name: &str) -> Option<&'a ColumnProfile> {
    profiles.iter().find(|p| p.name == name)
}
