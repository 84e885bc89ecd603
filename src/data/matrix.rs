//! Feature matrix / label vector extraction
//!
//! Any cell that is missing or does not read as a number is coerced to `0.0`.
//! This is lossy: a text column selected as a feature silently becomes a
//! column of zeros. The count of coerced cells is reported so callers can
//! surface it.

use super::{Table, Value};
use crate::error::{Result, TabulaError};
use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::warn;

/// Numeric view of a table for model fitting
#[derive(Debug, Clone, Serialize)]
pub struct FeatureData {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub feature_names: Vec<String>,
    /// Cells (features and target) that were coerced to 0
    pub coerced_cells: usize,
}

#[inline]
fn coerce(value: &Value, coerced: &mut usize) -> f64 {
    value.as_f64().unwrap_or_else(|| {
        *coerced += 1;
        0.0
    })
}

/// Extract `X` for the named feature columns.
///
/// Returns the matrix and the number of coerced cells.
pub fn extract_matrix(table: &Table, feature_columns: &[String]) -> Result<(Array2<f64>, usize)> {
    if feature_columns.is_empty() {
        return Err(TabulaError::ConfigError(
            "At least one feature column is required".to_string(),
        ));
    }

    let indices = feature_columns
        .iter()
        .map(|name| table.require_column(name))
        .collect::<Result<Vec<_>>>()?;

    let mut coerced = 0usize;
    let mut x = Array2::zeros((table.n_rows(), indices.len()));
    for (i, row) in table.rows().iter().enumerate() {
        for (j, &col) in indices.iter().enumerate() {
            x[[i, j]] = coerce(&row[col], &mut coerced);
        }
    }

    Ok((x, coerced))
}

/// Extract `X` and `y` for model fitting
pub fn extract_features(
    table: &Table,
    feature_columns: &[String],
    target_column: &str,
) -> Result<FeatureData> {
    if feature_columns.iter().any(|f| f == target_column) {
        return Err(TabulaError::ConfigError(format!(
            "Target column '{}' is also listed as a feature",
            target_column
        )));
    }

    let target_idx = table.require_column(target_column)?;
    let (x, mut coerced_cells) = extract_matrix(table, feature_columns)?;

    let y: Array1<f64> = table
        .column_values(target_idx)
        .map(|v| coerce(v, &mut coerced_cells))
        .collect();

    if coerced_cells > 0 {
        warn!(
            coerced_cells,
            rows = table.n_rows(),
            "Non-numeric or missing cells coerced to 0 during feature extraction"
        );
    }

    Ok(FeatureData {
        x,
        y,
        feature_names: feature_columns.to_vec(),
        coerced_cells,
    })
}
