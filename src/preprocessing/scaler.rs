//! Feature scaling implementations

use super::config::ScalingMethod;
use crate::data::{Table, Value};
use crate::error::{Result, TabulaError};
use serde::{Deserialize, Serialize};

/// Suffix of the derived column written by scaling
pub const SCALED_SUFFIX: &str = "_scaled";

/// Parameters for a fitted scaler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ScalingParams {
    /// Population mean and standard deviation
    Standardize { mean: f64, std: f64 },
    Normalize { min: f64, max: f64 },
}

impl ScalingParams {
    /// Offset and divisor of the affine map `(x - center) / scale`
    fn center_scale(&self) -> (f64, f64) {
        match *self {
            ScalingParams::Standardize { mean, std } => (mean, std),
            ScalingParams::Normalize { min, max } => (min, max - min),
        }
    }

    /// True when the divisor is zero and every output would be NaN
    pub fn is_degenerate(&self) -> bool {
        self.center_scale().1 == 0.0
    }

    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        let (center, scale) = self.center_scale();
        (x - center) / scale
    }
}

/// Scaling of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledColumn {
    pub column: String,
    pub output_column: String,
    pub params: ScalingParams,
}

pub fn scaled_column_name(column: &str) -> String {
    format!("{}{}", column, SCALED_SUFFIX)
}

/// Compute scaling parameters from the numeric cells of `column`
pub(crate) fn fit_scaler(table: &Table, column: &str, method: ScalingMethod) -> Result<ScaledColumn> {
    let idx = table.require_column(column)?;
    let values: Vec<f64> = table.column_values(idx).filter_map(Value::as_f64).collect();

    if values.is_empty() {
        return Err(TabulaError::DataError(format!(
            "Column '{}' has no numeric values to scale",
            column
        )));
    }

    let n = values.len() as f64;
    let params = match method {
        ScalingMethod::Standardize => {
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            ScalingParams::Standardize { mean, std: var.sqrt() }
        }
        ScalingMethod::Normalize => {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            ScalingParams::Normalize { min, max }
        }
    };

    Ok(ScaledColumn {
        column: column.to_string(),
        output_column: scaled_column_name(column),
        params,
    })
}

/// Write the `<name>_scaled` column.
///
/// Missing and non-numeric cells stay missing in the output. A degenerate
/// scaler (zero spread) yields NaN for every numeric cell.
pub(crate) fn apply_scaler(table: &mut Table, scaled: &ScaledColumn) -> Result<()> {
    let idx = table.require_column(&scaled.column)?;
    let output: Vec<Value> = table
        .column_values(idx)
        .map(|v| v.as_f64().map(|x| scaled.params.apply(x)).into())
        .collect();
    table.put_column(&scaled.output_column, output);
    Ok(())
}
