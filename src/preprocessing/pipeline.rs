//! Data preprocessing pipeline

use super::config::{PreprocessingConfig, PreprocessingStep, ScalingMethod};
use super::encoder::{apply_label_encoding, fit_label_encoding, ColumnEncoding};
use super::imputer::{self, ImputedColumn};
use super::scaler::{apply_scaler, fit_scaler, ScaledColumn};
use crate::data::Table;
use crate::error::{Result, TabulaError};
use crate::profiling::{find_profile, profile_table, ColumnKind, ColumnProfile};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// One applied preprocessing operation and the parameters it derived.
///
/// The log is append-only; replaying it in order against the original
/// table reproduces the preprocessed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformRecord {
    MissingValues {
        /// Columns whose missing cells caused row removal
        dropped_on: Vec<String>,
        rows_removed: usize,
        imputed: Vec<ImputedColumn>,
        /// Columns where the strategy did not apply (e.g. mean on text)
        skipped: Vec<String>,
    },
    LabelEncode {
        encodings: Vec<ColumnEncoding>,
    },
    Scale {
        method: ScalingMethod,
        columns: Vec<ScaledColumn>,
        /// Categorical columns left unscaled
        #[serde(default)]
        skipped: Vec<String>,
    },
    RemoveColumns {
        columns: Vec<String>,
    },
}

impl TransformRecord {
    /// Columns read or written by this operation
    pub fn affected_columns(&self) -> Vec<String> {
        match self {
            Self::MissingValues { dropped_on, imputed, .. } => dropped_on
                .iter()
                .cloned()
                .chain(imputed.iter().map(|i| i.column.clone()))
                .collect(),
            Self::LabelEncode { encodings } => {
                encodings.iter().map(|e| e.column.clone()).collect()
            }
            Self::Scale { columns, .. } => columns.iter().map(|c| c.column.clone()).collect(),
            Self::RemoveColumns { columns } => columns.clone(),
        }
    }
}

/// Result of a preprocessing run
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingOutcome {
    pub table: Table,
    pub transformations: Vec<TransformRecord>,
    pub rows_removed: usize,
    pub columns_removed: Vec<String>,
    /// Columns present in the output but not in the input, in output order
    pub new_columns: Vec<String>,
    pub preview_rows: Table,
    /// Profiles of the output table
    pub profiles: Vec<ColumnProfile>,
    /// Documented lossy outcomes, e.g. NaN from zero-spread scaling
    pub warnings: Vec<String>,
}

/// Caller-facing view of a preprocessing run (everything but the full table)
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingSummary {
    pub transformations: Vec<TransformRecord>,
    pub rows_removed: usize,
    pub columns_removed: Vec<String>,
    pub new_columns: Vec<String>,
    pub preview_rows: Table,
    pub warnings: Vec<String>,
}

impl PreprocessingOutcome {
    pub fn summary(&self) -> PreprocessingSummary {
        PreprocessingSummary {
            transformations: self.transformations.clone(),
            rows_removed: self.rows_removed,
            columns_removed: self.columns_removed.clone(),
            new_columns: self.new_columns.clone(),
            preview_rows: self.preview_rows.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

/// Main data preprocessing pipeline
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessingConfig,
}

impl Preprocessor {
    /// Create a new preprocessor with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new preprocessor with custom configuration
    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Apply the configured steps to `table`.
    ///
    /// `profiles` must describe `table`; they are recomputed internally
    /// whenever an earlier step has regenerated the table.
    pub fn apply(&self, table: &Table, profiles: &[ColumnProfile]) -> Result<PreprocessingOutcome> {
        let start = Instant::now();
        self.config.validate()?;

        let mut working = table.clone();
        let mut current_profiles: Option<Vec<ColumnProfile>> = None;
        let mut log = Vec::new();
        let mut warnings = Vec::new();
        let mut rows_removed = 0usize;
        let mut columns_removed = Vec::new();

        for step in self.config.ordered_steps() {
            debug!(step = step.name(), "Applying preprocessing step");
            let record = match step {
                PreprocessingStep::MissingValues { rules } => {
                    let profiles = current_profiles.as_deref().unwrap_or(profiles);
                    let outcome = imputer::apply_rules(&mut working, profiles, rules)?;
                    rows_removed += outcome.rows_removed;
                    TransformRecord::MissingValues {
                        dropped_on: outcome.dropped_on,
                        rows_removed: outcome.rows_removed,
                        imputed: outcome.imputed,
                        skipped: outcome.skipped,
                    }
                }
                PreprocessingStep::Encode { columns, .. } => {
                    let encodings = columns
                        .iter()
                        .map(|c| fit_label_encoding(&working, c))
                        .collect::<Result<Vec<_>>>()?;
                    for encoding in &encodings {
                        apply_label_encoding(&mut working, encoding)?;
                    }
                    TransformRecord::LabelEncode { encodings }
                }
                PreprocessingStep::Scale { method, columns } => {
                    let profiles = current_profiles.as_deref().unwrap_or(profiles);
                    let mut scaled_columns = Vec::with_capacity(columns.len());
                    let mut skipped = Vec::new();
                    for column in columns {
                        working.require_column(column)?;
                        if find_profile(profiles, column).is_some_and(|p| p.kind == ColumnKind::Categorical) {
                            warn!(column = %column, method = ?method, "Scaling skipped for categorical column");
                            warnings.push(format!("Column '{}' is categorical and was not scaled", column));
                            skipped.push(column.clone());
                            continue;
                        }
                        let scaled = fit_scaler(&working, column, *method)?;
                        if scaled.params.is_degenerate() {
                            if self.config.strict_scaling {
                                return Err(TabulaError::NumericalError(format!(
                                    "Column '{}' has zero spread; {:?} scaling divides by zero",
                                    column, method
                                )));
                            }
                            warn!(column = %column, method = ?method, "Zero-spread column scaled to NaN");
                            warnings.push(format!(
                                "Column '{}' has zero spread; '{}' contains NaN",
                                column, scaled.output_column
                            ));
                        }
                        apply_scaler(&mut working, &scaled)?;
                        scaled_columns.push(scaled);
                    }
                    TransformRecord::Scale {
                        method: *method,
                        columns: scaled_columns,
                        skipped,
                    }
                }
                PreprocessingStep::RemoveColumns { columns } => {
                    for column in columns {
                        working.require_column(column)?;
                    }
                    let removed = working.drop_columns(columns);
                    columns_removed.extend(removed.iter().cloned());
                    TransformRecord::RemoveColumns { columns: removed }
                }
            };
            log.push(record);
            current_profiles = Some(profile_table(&working));
        }

        let new_columns: Vec<String> = working
            .columns()
            .iter()
            .filter(|c| !table.has_column(c))
            .cloned()
            .collect();

        let profiles = current_profiles.unwrap_or_else(|| profile_table(&working));
        info!(
            steps = log.len(),
            rows_in = table.n_rows(),
            rows_out = working.n_rows(),
            new_columns = new_columns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Preprocessing complete"
        );

        Ok(PreprocessingOutcome {
            preview_rows: working.head(self.config.preview_rows),
            table: working,
            transformations: log,
            rows_removed,
            columns_removed,
            new_columns,
            profiles,
            warnings,
        })
    }
}

/// Apply `steps` to `table`, returning the new table and the transform log
pub fn apply(
    table: &Table,
    profiles: &[ColumnProfile],
    steps: &[PreprocessingStep],
) -> Result<(Table, Vec<TransformRecord>)> {
    let config = PreprocessingConfig {
        steps: steps.to_vec(),
        ..PreprocessingConfig::default()
    };
    let outcome = Preprocessor::with_config(config).apply(table, profiles)?;
    Ok((outcome.table, outcome.transformations))
}

/// Re-apply a transform log using only its recorded parameters
pub fn replay(original: &Table, log: &[TransformRecord]) -> Result<Table> {
    let mut table = original.clone();

    for record in log {
        match record {
            TransformRecord::MissingValues { dropped_on, imputed, .. } => {
                imputer::drop_missing_rows(&mut table, dropped_on)?;
                for fill in imputed {
                    let idx = table.require_column(&fill.column)?;
                    imputer::fill_missing(&mut table, idx, &fill.value);
                }
            }
            TransformRecord::LabelEncode { encodings } => {
                for encoding in encodings {
                    apply_label_encoding(&mut table, encoding)?;
                }
            }
            TransformRecord::Scale { columns, .. } => {
                for scaled in columns {
                    apply_scaler(&mut table, scaled)?;
                }
            }
            TransformRecord::RemoveColumns { columns } => {
                table.drop_columns(columns);
            }
        }
    }

    Ok(table)
}
