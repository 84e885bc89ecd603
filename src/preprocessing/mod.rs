//! Data preprocessing module
//!
//! Applies an ordered list of steps to a [`Table`](crate::data::Table):
//! - Missing value handling (drop, mean, median, mode, constant)
//! - Categorical label encoding into `<name>_encoded`
//! - Numeric scaling (standardize, normalize) into `<name>_scaled`
//! - Column removal
//!
//! Steps run in that stage order regardless of how they are listed. Every
//! applied step appends a [`TransformRecord`] with the parameters it derived,
//! and [`replay`] rebuilds the output from the original table and the log.

mod config;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use config::{
    EncodingMethod, MissingStrategy, MissingValueRule, PreprocessingConfig, PreprocessingStep,
    ScalingMethod, DEFAULT_PREVIEW_ROWS,
};
pub use encoder::{encoded_column_name, ColumnEncoding, DictionaryEntry, ENCODED_SUFFIX};
pub use imputer::ImputedColumn;
pub use pipeline::{
    apply, replay, PreprocessingOutcome, PreprocessingSummary, Preprocessor, TransformRecord,
};
pub use scaler::{scaled_column_name, ScaledColumn, ScalingParams, SCALED_SUFFIX};
