//! Tabula - tabular machine learning pipeline
//!
//! This crate takes a table of records from profiling to a scored model:
//! - Column profiling and type inference
//! - Preprocessing with a replayable transform log
//! - Seeded, reproducible train/test splitting
//! - From-scratch models (linear, logistic, decision tree, random forest)
//! - Regression and classification metrics
//!
//! # Modules
//!
//! ## Data
//! - [`data`] - In-memory table, CSV ingestion, feature extraction
//! - [`profiling`] - Per-column statistics and kind inference
//! - [`preprocessing`] - Imputation, encoding, scaling, column removal
//! - [`split`] - LCG-seeded shuffle and train/test partition
//!
//! ## Models
//! - [`training`] - Model fitting and the training engine
//! - [`evaluation`] - Metrics and feature importance
//!
//! ## Orchestration
//! - [`session`] - Per-session artifact store and pipeline driver
//! - [`config`] - Whole-pipeline JSON configuration
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data
pub mod data;
pub mod profiling;
pub mod preprocessing;
pub mod split;

// Models
pub mod training;
pub mod evaluation;

// Orchestration
pub mod session;
pub mod config;
pub mod cli;

pub use error::{Result, TabulaError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, TabulaError};

    // Data
    pub use crate::data::{load_csv, Table, Value};
    pub use crate::profiling::{profile_table, ColumnKind, ColumnProfile};

    // Preprocessing
    pub use crate::preprocessing::{PreprocessingConfig, PreprocessingStep, Preprocessor};

    // Splitting
    pub use crate::split::{split, Split, SplitConfig};

    // Training
    pub use crate::training::{Model, ModelType, TaskType, TrainEngine, TrainingConfig};

    // Evaluation
    pub use crate::evaluation::{evaluate, Metrics};

    // Orchestration
    pub use crate::config::PipelineConfig;
    pub use crate::session::{InMemorySessionStore, Pipeline, SessionStore};
}
