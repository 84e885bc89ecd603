//! The trained-model sum type and shared input checks

use super::config::{Hyperparameters, ModelType, TaskType};
use super::decision_tree::DecisionTree;
use super::linear_models::{LinearRegression, LogisticRegression};
use super::random_forest::RandomForest;
use crate::error::{Result, TabulaError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Reject empty, mismatched or non-finite training inputs before fitting
pub(crate) fn check_fit_inputs(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(TabulaError::InvalidInput(format!(
            "Training matrix is empty ({} rows x {} columns)",
            x.nrows(),
            x.ncols()
        )));
    }
    if x.nrows() != y.len() {
        return Err(TabulaError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    check_finite(x)?;
    if let Some(row) = y.iter().position(|v| !v.is_finite()) {
        return Err(TabulaError::InvalidInput(format!(
            "Label at row {} is not a finite number",
            row
        )));
    }
    Ok(())
}

/// Reject prediction inputs whose width differs from the fitted width
pub(crate) fn check_predict_inputs(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(TabulaError::ShapeError {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    check_finite(x)
}

fn check_finite(x: &Array2<f64>) -> Result<()> {
    if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(TabulaError::InvalidInput(format!(
            "Cell ({}, {}) is not a finite number",
            row, col
        )));
    }
    Ok(())
}

/// A fitted model of any supported family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "model", rename_all = "snake_case")]
pub enum Model {
    Linear(LinearRegression),
    Logistic(LogisticRegression),
    Tree(DecisionTree),
    Forest(RandomForest),
}

impl Model {
    /// Fit a model of `model_type` on `x`/`y`
    pub fn fit(
        model_type: ModelType,
        task: TaskType,
        hyperparameters: &Hyperparameters,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<Self> {
        if let Some(implied) = model_type.implied_task() {
            if implied != task {
                return Err(TabulaError::ConfigError(format!(
                    "{} only supports {:?}, not {:?}",
                    model_type, implied, task
                )));
            }
        }

        let hp = hyperparameters;
        let model = match model_type {
            ModelType::LinearRegression => {
                let mut m = LinearRegression::new();
                m.fit(x, y)?;
                Model::Linear(m)
            }
            ModelType::LogisticRegression => {
                let mut m = LogisticRegression::new()
                    .with_learning_rate(hp.learning_rate)
                    .with_iterations(hp.iterations);
                m.fit(x, y)?;
                Model::Logistic(m)
            }
            ModelType::DecisionTree => {
                let mut m = DecisionTree::new(task)
                    .with_max_depth(hp.max_depth)
                    .with_min_samples(hp.min_samples);
                m.fit(x, y)?;
                Model::Tree(m)
            }
            ModelType::RandomForest => {
                let mut m = RandomForest::new(task, hp.n_trees)
                    .with_max_depth(hp.max_depth)
                    .with_min_samples(hp.min_samples)
                    .with_bootstrap(hp.bootstrap)
                    .with_seed(hp.seed);
                m.fit(x, y)?;
                Model::Forest(m)
            }
        };
        Ok(model)
    }

    pub fn model_type(&self) -> ModelType {
        match self {
            Model::Linear(_) => ModelType::LinearRegression,
            Model::Logistic(_) => ModelType::LogisticRegression,
            Model::Tree(_) => ModelType::DecisionTree,
            Model::Forest(_) => ModelType::RandomForest,
        }
    }

    pub fn task(&self) -> TaskType {
        match self {
            Model::Linear(_) => TaskType::Regression,
            Model::Logistic(_) => TaskType::Classification,
            Model::Tree(m) => m.task,
            Model::Forest(m) => m.task,
        }
    }

    /// Raw model output: values, class labels, or positive-class probabilities
    /// for logistic regression
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Model::Linear(m) => m.predict(x),
            Model::Logistic(m) => m.predict_proba(x),
            Model::Tree(m) => m.predict(x),
            Model::Forest(m) => m.predict(x),
        }
    }

    /// Like [`Model::predict`], with logistic probabilities thresholded at 0.5
    pub fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Model::Logistic(m) => m.predict_labels(x),
            other => other.predict(x),
        }
    }

    /// Positive-class probabilities, for models that produce them
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array1<f64>>> {
        match self {
            Model::Logistic(m) => m.predict_proba(x).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dispatch_by_type() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let hp = Hyperparameters::default();

        let linear = Model::fit(ModelType::LinearRegression, TaskType::Regression, &hp, &x, &y).unwrap();
        assert_eq!(linear.model_type(), ModelType::LinearRegression);
        let pred = linear.predict(&array![[4.0]]).unwrap();
        assert!((pred[0] - 9.0).abs() < 1e-8);

        let tree = Model::fit(ModelType::DecisionTree, TaskType::Regression, &hp, &x, &y).unwrap();
        assert_eq!(tree.task(), TaskType::Regression);
        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_logistic_outputs() {
        let x = array![[-2.0], [-1.0], [1.0], [2.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let hp = Hyperparameters::default().with_learning_rate(0.5);
        let model = Model::fit(ModelType::LogisticRegression, TaskType::Classification, &hp, &x, &y).unwrap();

        let proba = model.predict(&x).unwrap();
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(model.predict_labels(&x).unwrap(), y);
        assert!(model.predict_proba(&x).unwrap().is_some());
    }

    #[test]
    fn test_malformed_inputs_are_rejected() {
        let hp = Hyperparameters::default();
        let empty = Array2::<f64>::zeros((0, 2));
        let err = Model::fit(ModelType::LinearRegression, TaskType::Regression, &hp, &empty, &array![]).unwrap_err();
        assert!(matches!(err, TabulaError::InvalidInput(_)));

        let x = array![[1.0], [2.0]];
        let err = Model::fit(ModelType::LinearRegression, TaskType::Regression, &hp, &x, &array![1.0]).unwrap_err();
        assert!(matches!(err, TabulaError::ShapeError { .. }));

        let x = array![[1.0], [f64::NAN]];
        let err = Model::fit(ModelType::DecisionTree, TaskType::Regression, &hp, &x, &array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, TabulaError::InvalidInput(_)));
    }

    #[test]
    fn test_task_mismatch() {
        let hp = Hyperparameters::default();
        let x = array![[1.0], [2.0]];
        let y = array![0.0, 1.0];
        assert!(Model::fit(ModelType::LinearRegression, TaskType::Classification, &hp, &x, &y).is_err());
    }
}
