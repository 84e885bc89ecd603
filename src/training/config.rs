//! Training configuration

use crate::error::{Result, TabulaError};
use serde::{Deserialize, Serialize};

/// Upper bound on gradient-descent iterations
pub const MAX_ITERATIONS: usize = 1_000_000;
/// Upper bound on forest size
pub const MAX_TREES: usize = 1_000;
/// Upper bound on tree depth
pub const MAX_TREE_DEPTH: usize = 64;

/// Type of ML task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Classification,
    Regression,
}

/// Type of model to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Ordinary least squares via the normal equation
    LinearRegression,
    /// Binary logistic regression via batch gradient descent
    LogisticRegression,
    DecisionTree,
    RandomForest,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::LinearRegression => "linear_regression",
            ModelType::LogisticRegression => "logistic_regression",
            ModelType::DecisionTree => "decision_tree",
            ModelType::RandomForest => "random_forest",
        }
    }

    /// Task implied by the model family, if it only supports one
    pub fn implied_task(&self) -> Option<TaskType> {
        match self {
            ModelType::LinearRegression => Some(TaskType::Regression),
            ModelType::LogisticRegression => Some(TaskType::Classification),
            ModelType::DecisionTree | ModelType::RandomForest => None,
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelType {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear_regression" => Ok(ModelType::LinearRegression),
            "logistic_regression" => Ok(ModelType::LogisticRegression),
            "decision_tree" => Ok(ModelType::DecisionTree),
            "random_forest" => Ok(ModelType::RandomForest),
            other => Err(TabulaError::ConfigError(format!(
                "Unknown model type '{}'",
                other
            ))),
        }
    }
}

/// Optional model hyperparameters; unset fields take their defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Gradient-descent step size (logistic regression)
    pub learning_rate: f64,
    /// Gradient-descent iterations (logistic regression)
    pub iterations: usize,
    pub max_depth: usize,
    /// Nodes with fewer samples become leaves
    pub min_samples: usize,
    pub n_trees: usize,
    /// Draw a bootstrap resample per tree (random forest)
    pub bootstrap: bool,
    /// Base seed for forest bootstraps
    pub seed: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            iterations: 1000,
            max_depth: 10,
            min_samples: 2,
            n_trees: 10,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl Hyperparameters {
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn with_n_trees(mut self, n: usize) -> Self {
        self.n_trees = n;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject values outside the supported ranges before any fitting starts
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TabulaError::invalid_parameter(
                "learning_rate",
                self.learning_rate,
                "must be a positive finite number",
            ));
        }
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(TabulaError::invalid_parameter(
                "iterations",
                self.iterations,
                format!("must be in 1..={}", MAX_ITERATIONS),
            ));
        }
        if self.max_depth > MAX_TREE_DEPTH {
            return Err(TabulaError::invalid_parameter(
                "max_depth",
                self.max_depth,
                format!("must be at most {}", MAX_TREE_DEPTH),
            ));
        }
        if self.n_trees == 0 || self.n_trees > MAX_TREES {
            return Err(TabulaError::invalid_parameter(
                "n_trees",
                self.n_trees,
                format!("must be in 1..={}", MAX_TREES),
            ));
        }
        Ok(())
    }
}

/// Configuration for one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub model_type: ModelType,
    /// Required for tree models; implied for linear and logistic regression
    #[serde(default)]
    pub task_type: Option<TaskType>,
    pub target_column: String,
    pub feature_columns: Vec<String>,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
}

impl TrainingConfig {
    pub fn new(model_type: ModelType, target: impl Into<String>) -> Self {
        Self {
            model_type,
            task_type: model_type.implied_task(),
            target_column: target.into(),
            feature_columns: Vec::new(),
            hyperparameters: Hyperparameters::default(),
        }
    }

    pub fn with_task(mut self, task_type: TaskType) -> Self {
        self.task_type = Some(task_type);
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_columns = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    /// The task this run performs, after reconciling the model family
    pub fn task(&self) -> Result<TaskType> {
        match (self.model_type.implied_task(), self.task_type) {
            (Some(implied), Some(requested)) if implied != requested => {
                Err(TabulaError::ConfigError(format!(
                    "{} only supports {:?}, not {:?}",
                    self.model_type, implied, requested
                )))
            }
            (Some(implied), _) => Ok(implied),
            (None, Some(requested)) => Ok(requested),
            (None, None) => Err(TabulaError::ConfigError(format!(
                "task_type is required for {}",
                self.model_type
            ))),
        }
    }

    /// Structural checks that need no data
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(TabulaError::ConfigError(
                "A target column is required".to_string(),
            ));
        }
        if self.feature_columns.is_empty() {
            return Err(TabulaError::ConfigError(
                "At least one feature column is required".to_string(),
            ));
        }
        if self.feature_columns.contains(&self.target_column) {
            return Err(TabulaError::ConfigError(format!(
                "Target column '{}' is also listed as a feature",
                self.target_column
            )));
        }
        self.task()?;
        self.hyperparameters.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hyperparameters() {
        let hp = Hyperparameters::default();
        assert_eq!(hp.learning_rate, 0.01);
        assert_eq!(hp.iterations, 1000);
        assert_eq!(hp.max_depth, 10);
        assert_eq!(hp.min_samples, 2);
        assert_eq!(hp.n_trees, 10);
        assert!(hp.validate().is_ok());
    }

    #[test]
    fn test_task_reconciliation() {
        let linear = TrainingConfig::new(ModelType::LinearRegression, "y").with_features(["x"]);
        assert_eq!(linear.task().unwrap(), TaskType::Regression);

        let bad = linear.clone().with_task(TaskType::Classification);
        assert!(matches!(bad.task(), Err(TabulaError::ConfigError(_))));

        let tree = TrainingConfig::new(ModelType::DecisionTree, "y").with_features(["x"]);
        assert!(tree.task().is_err());
        assert_eq!(
            tree.with_task(TaskType::Regression).task().unwrap(),
            TaskType::Regression
        );
    }

    #[test]
    fn test_bounds() {
        let hp = Hyperparameters::default().with_n_trees(MAX_TREES + 1);
        assert!(matches!(hp.validate(), Err(TabulaError::InvalidParameter { .. })));
        let hp = Hyperparameters::default().with_iterations(0);
        assert!(hp.validate().is_err());
        let hp = Hyperparameters::default().with_max_depth(MAX_TREE_DEPTH + 1);
        assert!(hp.validate().is_err());
        let hp = Hyperparameters::default().with_learning_rate(f64::NAN);
        assert!(hp.validate().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "model_type": "random_forest",
            "task_type": "classification",
            "target_column": "label",
            "feature_columns": ["a", "b"],
            "hyperparameters": {"n_trees": 5}
        }"#;
        let config: TrainingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.model_type, ModelType::RandomForest);
        assert_eq!(config.hyperparameters.n_trees, 5);
        assert_eq!(config.hyperparameters.max_depth, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_model_type_from_str() {
        assert_eq!("decision_tree".parse::<ModelType>().unwrap(), ModelType::DecisionTree);
        assert!("svm".parse::<ModelType>().is_err());
    }
}
