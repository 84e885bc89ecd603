//! Model training module
//!
//! Four model families, all implemented from scratch:
//! - Linear regression (normal equation, Gauss-Jordan inversion)
//! - Logistic regression (batch gradient descent)
//! - Decision trees (Gini or variance splits)
//! - Random forests (bagged trees fitted in parallel)
//!
//! [`Model`] is the fitted sum type; [`TrainEngine`] runs a configured fit
//! on a [`Split`](crate::split::Split) and scores it.

mod config;
mod engine;
mod models;
pub mod decision_tree;
pub mod linear_models;
pub mod random_forest;

pub use config::{
    Hyperparameters, ModelType, TaskType, TrainingConfig, MAX_ITERATIONS, MAX_TREES,
    MAX_TREE_DEPTH,
};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{
    MulticlassReport, PredictionSample, TrainEngine, TrainingOutcome, TrainingSummary,
    MAX_CLASSES, PREDICTION_SAMPLE_SIZE,
};
pub use linear_models::{LinearRegression, LogisticRegression};
pub use models::Model;
pub use random_forest::RandomForest;

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Fit a model of `model_type` on `x`/`y`
pub fn fit(
    model_type: ModelType,
    task: TaskType,
    hyperparameters: &Hyperparameters,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<Model> {
    Model::fit(model_type, task, hyperparameters, x, y)
}

/// Predict with any fitted model; logistic regression yields probabilities
pub fn predict(model: &Model, x: &Array2<f64>) -> Result<Array1<f64>> {
    model.predict(x)
}
