//! Error types for the tabula pipeline

use serde::Serialize;
use thiserror::Error;

/// Result type alias for tabula operations
pub type Result<T> = std::result::Result<T, TabulaError>;

/// Broad failure family, used by callers to decide what to suggest next.
///
/// Configuration errors mean the request itself is wrong, data errors mean a
/// different dataset (or target) is needed, numerical errors mean different
/// data or hyperparameters for the same request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Data,
    Numerical,
    Evaluation,
    Io,
}

/// Main error type for the tabula pipeline
#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error(
        "Degenerate split: {n_rows} rows with test fraction {test_fraction} gives \
         {train_count} train / {test_count} test rows"
    )]
    DegenerateSplit {
        n_rows: usize,
        test_fraction: f64,
        train_count: usize,
        test_count: usize,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Singular matrix: pivot {pivot:e} in column {column}")]
    SingularMatrix { column: usize, pivot: f64 },

    #[error("Numerical error: {0}")]
    NumericalError(String),

    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Ingestion error: {0}")]
    IngestError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl TabulaError {
    /// Failure family of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            TabulaError::ConfigError(_)
            | TabulaError::ColumnNotFound(_)
            | TabulaError::InvalidParameter { .. }
            | TabulaError::SessionNotFound(_)
            | TabulaError::ModelNotFitted => ErrorCategory::Configuration,
            TabulaError::DataError(_)
            | TabulaError::DegenerateSplit { .. }
            | TabulaError::ShapeError { .. }
            | TabulaError::InvalidInput(_)
            | TabulaError::IngestError(_) => ErrorCategory::Data,
            TabulaError::SingularMatrix { .. } | TabulaError::NumericalError(_) => {
                ErrorCategory::Numerical
            }
            TabulaError::EvaluationError(_) => ErrorCategory::Evaluation,
            TabulaError::IoError(_) | TabulaError::SerializationError(_) => ErrorCategory::Io,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            TabulaError::ConfigError(_) => "CONFIG_ERROR",
            TabulaError::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            TabulaError::InvalidParameter { .. } => "INVALID_PARAMETER",
            TabulaError::DataError(_) => "DATA_ERROR",
            TabulaError::DegenerateSplit { .. } => "DEGENERATE_SPLIT",
            TabulaError::ShapeError { .. } => "SHAPE_ERROR",
            TabulaError::InvalidInput(_) => "INVALID_INPUT",
            TabulaError::ModelNotFitted => "MODEL_NOT_FITTED",
            TabulaError::SingularMatrix { .. } => "SINGULAR_MATRIX",
            TabulaError::NumericalError(_) => "NUMERICAL_ERROR",
            TabulaError::EvaluationError(_) => "EVALUATION_ERROR",
            TabulaError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            TabulaError::IngestError(_) => "INGEST_ERROR",
            TabulaError::IoError(_) => "IO_ERROR",
            TabulaError::SerializationError(_) => "SERIALIZATION_ERROR",
        }
    }

    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        TabulaError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for TabulaError {
    fn from(err: polars::error::PolarsError) -> Self {
        TabulaError::IngestError(err.to_string())
    }
}

impl From<serde_json::Error> for TabulaError {
    fn from(err: serde_json::Error) -> Self {
        TabulaError::SerializationError(err.to_string())
    }
}
