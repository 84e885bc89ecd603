//! Preprocessing configuration

use crate::data::Value;
use crate::error::{Result, TabulaError};
use serde::{Deserialize, Serialize};

/// Rows kept in the preview of the preprocessed table
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// Strategy for handling missing values in one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Remove rows where the column is missing
    Drop,
    /// Replace with the column mean (numeric columns only)
    Mean,
    /// Replace with the column median (numeric columns only)
    Median,
    /// Replace with the most frequent value
    Mode,
    /// Replace with a caller-supplied constant
    Constant,
}

/// Missing-value rule for a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValueRule {
    pub column: String,
    pub strategy: MissingStrategy,
    /// Fill value, required by [`MissingStrategy::Constant`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<Value>,
}

impl MissingValueRule {
    pub fn new(column: impl Into<String>, strategy: MissingStrategy) -> Self {
        Self {
            column: column.into(),
            strategy,
            constant: None,
        }
    }

    pub fn constant(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            strategy: MissingStrategy::Constant,
            constant: Some(value.into()),
        }
    }
}

/// Categorical encoding method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMethod {
    /// Integer index per distinct value, in first-seen order
    #[default]
    Label,
}

/// Numeric scaling method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMethod {
    /// z-score: (x - mean) / std
    Standardize,
    /// min-max: (x - min) / (max - min)
    Normalize,
}

/// One entry of the preprocessing configuration list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PreprocessingStep {
    MissingValues {
        rules: Vec<MissingValueRule>,
    },
    Encode {
        #[serde(default)]
        method: EncodingMethod,
        columns: Vec<String>,
    },
    Scale {
        method: ScalingMethod,
        columns: Vec<String>,
    },
    RemoveColumns {
        columns: Vec<String>,
    },
}

impl PreprocessingStep {
    pub fn missing_values(rules: Vec<MissingValueRule>) -> Self {
        Self::MissingValues { rules }
    }

    pub fn label_encode<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::Encode {
            method: EncodingMethod::Label,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn standardize<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::Scale {
            method: ScalingMethod::Standardize,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn normalize<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::Scale {
            method: ScalingMethod::Normalize,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remove_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::RemoveColumns {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Position in the fixed stage order:
    /// missing values, encoding, scaling, column removal
    pub fn stage(&self) -> u8 {
        match self {
            Self::MissingValues { .. } => 0,
            Self::Encode { .. } => 1,
            Self::Scale { .. } => 2,
            Self::RemoveColumns { .. } => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MissingValues { .. } => "missing_values",
            Self::Encode { .. } => "encode",
            Self::Scale { .. } => "scale",
            Self::RemoveColumns { .. } => "remove_columns",
        }
    }

    /// Static checks that need no data
    pub fn validate(&self) -> Result<()> {
        let empty = match self {
            Self::MissingValues { rules } => rules.is_empty(),
            Self::Encode { columns, .. }
            | Self::Scale { columns, .. }
            | Self::RemoveColumns { columns } => columns.is_empty(),
        };
        if empty {
            return Err(TabulaError::ConfigError(format!(
                "Preprocessing step '{}' targets no columns",
                self.name()
            )));
        }

        if let Self::MissingValues { rules } = self {
            for rule in rules {
                if rule.strategy == MissingStrategy::Constant
                    && rule.constant.as_ref().map_or(true, Value::is_missing)
                {
                    return Err(TabulaError::invalid_parameter(
                        "constant",
                        &rule.column,
                        "constant strategy requires a non-null fill value",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Configuration for a preprocessing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Steps, applied in stage order (config order within a stage)
    pub steps: Vec<PreprocessingStep>,

    /// Fail instead of producing NaN when a scaled column has zero spread
    #[serde(default)]
    pub strict_scaling: bool,

    /// Rows included in the outcome preview
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_preview_rows() -> usize {
    DEFAULT_PREVIEW_ROWS
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            strict_scaling: false,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl PreprocessingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to append a step
    pub fn with_step(mut self, step: PreprocessingStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Builder method to set strict scaling
    pub fn with_strict_scaling(mut self, strict: bool) -> Self {
        self.strict_scaling = strict;
        self
    }

    /// Builder method to set preview size
    pub fn with_preview_rows(mut self, n: usize) -> Self {
        self.preview_rows = n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.steps.iter().try_for_each(PreprocessingStep::validate)
    }

    /// Steps in application order
    pub fn ordered_steps(&self) -> Vec<&PreprocessingStep> {
        let mut steps: Vec<&PreprocessingStep> = self.steps.iter().collect();
        // sort_by_key is stable, so config order is kept within a stage
        steps.sort_by_key(|s| s.stage());
        steps
    }
}
