//! Variance-proxy feature importance
//!
//! Ranks features by the variance of their own training column. This does
//! not look at the model at all; it is a cheap stand-in for permutation or
//! gain-based importance.

use crate::error::{Result, TabulaError};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    /// Share of the total feature variance, in percent
    pub importance: f64,
}

/// Percent share of each column's population variance, highest first.
///
/// All shares are 0 when the total variance is 0. Ties keep column order.
pub fn variance_importance(x: &Array2<f64>, feature_names: &[String]) -> Result<Vec<FeatureImportance>> {
    if x.ncols() != feature_names.len() {
        return Err(TabulaError::ShapeError {
            expected: format!("{} feature names", x.ncols()),
            actual: format!("{} feature names", feature_names.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(TabulaError::EvaluationError(
            "Cannot rank features on an empty matrix".to_string(),
        ));
    }

    let variances = x.var_axis(Axis(0), 0.0);
    let total = variances.sum();

    let mut ranked: Vec<FeatureImportance> = feature_names
        .iter()
        .zip(variances.iter())
        .map(|(name, &v)| FeatureImportance {
            feature: name.clone(),
            importance: if total > 0.0 { v / total * 100.0 } else { 0.0 },
        })
        .collect();

    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    Ok(ranked)
}
