//! Model evaluation
//!
//! Regression metrics, binary confusion-matrix metrics, macro-averaged
//! multi-class metrics, and a variance-based feature ranking.

mod importance;
mod metrics;

pub use importance::{variance_importance, FeatureImportance};
pub use metrics::{
    evaluate, is_positive, BinaryConfusion, ClassificationMetrics, Metrics, MulticlassMetrics,
    RegressionMetrics,
};
