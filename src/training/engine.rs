//! Training engine: fit a configured model on a split and score it

use super::config::{ModelType, TaskType, TrainingConfig};
use super::models::Model;
use crate::data::{extract_features, FeatureData, Table};
use crate::error::{Result, TabulaError};
use crate::evaluation::{
    evaluate, variance_importance, FeatureImportance, Metrics, MulticlassMetrics,
};
use crate::split::Split;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Test rows echoed back in [`TrainingOutcome::predictions_sample`]
pub const PREDICTION_SAMPLE_SIZE: usize = 10;

/// More distinct labels than this suggests a regression target
pub const MAX_CLASSES: usize = 20;

/// One held-out prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSample {
    pub actual: f64,
    pub predicted: f64,
    /// Positive-class probability, for logistic regression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

/// Macro-averaged scores, reported when the target has more than two classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MulticlassReport {
    pub train: MulticlassMetrics,
    pub test: MulticlassMetrics,
}

/// Everything a training run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub model: Model,
    pub task_type: TaskType,
    pub feature_names: Vec<String>,
    pub train_metrics: Metrics,
    pub test_metrics: Metrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiclass: Option<MulticlassReport>,
    pub feature_importance: Vec<FeatureImportance>,
    pub training_time_ms: f64,
    pub predictions_sample: Vec<PredictionSample>,
    /// Cells coerced to 0 while building the train and test matrices
    pub coerced_cells: usize,
}

/// Caller-facing view of a training run, without the model itself
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub model_type: ModelType,
    pub task_type: TaskType,
    pub train_metrics: Metrics,
    pub test_metrics: Metrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiclass: Option<MulticlassReport>,
    pub feature_importance: Vec<FeatureImportance>,
    pub training_time_ms: f64,
    pub predictions_sample: Vec<PredictionSample>,
}

impl TrainingOutcome {
    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            model_type: self.model.model_type(),
            task_type: self.task_type,
            train_metrics: self.train_metrics.clone(),
            test_metrics: self.test_metrics.clone(),
            multiclass: self.multiclass.clone(),
            feature_importance: self.feature_importance.clone(),
            training_time_ms: self.training_time_ms,
            predictions_sample: self.predictions_sample.clone(),
        }
    }
}

/// Distinct values of `y`, ascending
fn distinct_labels(y: &Array1<f64>) -> Vec<f64> {
    let mut labels = y.to_vec();
    labels.sort_by(|a, b| a.total_cmp(b));
    labels.dedup();
    labels
}

/// Reject targets that cannot be classified, with a hint when they look
/// like a regression target
fn check_classification_target(target: &str, model_type: ModelType, y: &Array1<f64>) -> Result<Vec<f64>> {
    let labels = distinct_labels(y);

    if labels.len() < 2 {
        return Err(TabulaError::DataError(format!(
            "Target '{}' has a single class in the training set; classification needs at least two",
            target
        )));
    }
    if labels.iter().any(|l| l.fract() != 0.0) || labels.len() > MAX_CLASSES {
        return Err(TabulaError::DataError(format!(
            "Target '{}' has {} distinct values{}; it looks like regression, not classification",
            target,
            labels.len(),
            if labels.iter().any(|l| l.fract() != 0.0) { " including non-integers" } else { "" }
        )));
    }
    if model_type == ModelType::LogisticRegression && labels.iter().any(|&l| l != 0.0 && l != 1.0) {
        return Err(TabulaError::DataError(format!(
            "Logistic regression is binary but target '{}' has classes {:?}",
            target, labels
        )));
    }
    Ok(labels)
}

/// Trains one configured model per call
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit on the train partition of `split` and score both partitions
    pub fn train(&self, split: &Split) -> Result<TrainingOutcome> {
        self.train_tables(&split.train, &split.test)
    }

    pub fn train_tables(&self, train: &Table, test: &Table) -> Result<TrainingOutcome> {
        self.config.validate()?;
        let task = self.config.task()?;
        let target = self.config.target_column.as_str();

        train.require_column(target)?;
        if !test.has_column(target) {
            return Err(TabulaError::DataError(format!(
                "Target column '{}' is missing from the test partition",
                target
            )));
        }

        let train_data = extract_features(train, &self.config.feature_columns, target)?;
        let test_data = extract_features(test, &self.config.feature_columns, target)?;

        let labels = match task {
            TaskType::Classification => Some(check_classification_target(
                target,
                self.config.model_type,
                &train_data.y,
            )?),
            TaskType::Regression => None,
        };

        let start = Instant::now();
        let model = Model::fit(
            self.config.model_type,
            task,
            &self.config.hyperparameters,
            &train_data.x,
            &train_data.y,
        )?;
        let training_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        let train_pred = model.predict_labels(&train_data.x)?;
        let test_pred = model.predict_labels(&test_data.x)?;

        let positive = labels.as_ref().and_then(|l| l.last().copied());
        let train_metrics = score(task, positive, &train_data.y, &train_pred)?;
        let test_metrics = score(task, positive, &test_data.y, &test_pred)?;

        let multiclass = match &labels {
            Some(l) if l.len() > 2 => Some(MulticlassReport {
                train: multiclass_metrics(&train_data.y, &train_pred)?,
                test: multiclass_metrics(&test_data.y, &test_pred)?,
            }),
            _ => None,
        };

        let feature_importance = match model.model_type() {
            ModelType::DecisionTree | ModelType::RandomForest => {
                variance_importance(&train_data.x, &train_data.feature_names)?
            }
            ModelType::LinearRegression | ModelType::LogisticRegression => Vec::new(),
        };

        let predictions_sample = prediction_sample(&model, &test_data, &test_pred)?;

        info!(
            model = %self.config.model_type,
            task = ?task,
            train_rows = train_data.x.nrows(),
            test_rows = test_data.x.nrows(),
            training_time_ms,
            "Model trained"
        );
        debug!(?test_metrics, "Held-out metrics");

        Ok(TrainingOutcome {
            model,
            task_type: task,
            feature_names: train_data.feature_names,
            train_metrics,
            test_metrics,
            multiclass,
            feature_importance,
            training_time_ms,
            predictions_sample,
            coerced_cells: train_data.coerced_cells + test_data.coerced_cells,
        })
    }
}

/// Evaluate with classification labels recoded so `positive` is 1 and every
/// other label is 0. The largest training label is the positive class.
fn score(task: TaskType, positive: Option<f64>, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Metrics> {
    match positive {
        Some(p) => {
            let indicator = |y: &Array1<f64>| y.mapv(|v| if v == p { 1.0 } else { 0.0 });
            evaluate(task, &indicator(y_true), &indicator(y_pred))
        }
        None => evaluate(task, y_true, y_pred),
    }
}

fn multiclass_metrics(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<MulticlassMetrics> {
    MulticlassMetrics::compute(&y_true.to_vec(), &y_pred.to_vec())
}

fn prediction_sample(model: &Model, test: &FeatureData, predicted: &Array1<f64>) -> Result<Vec<PredictionSample>> {
    let n = test.x.nrows().min(PREDICTION_SAMPLE_SIZE);
    let head = test.x.slice(ndarray::s![..n, ..]).to_owned();
    let probabilities = model.predict_proba(&head)?;

    Ok((0..n)
        .map(|i| PredictionSample {
            actual: test.y[i],
            predicted: predicted[i],
            probability: probabilities.as_ref().map(|p| p[i]),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::split::split;
    use crate::training::Hyperparameters;

    fn linear_table() -> Table {
        let rows = (0..20)
            .map(|i| {
                let x = i as f64 * 0.25;
                vec![Value::Number(x), Value::Number(2.0 * x + 3.0)]
            })
            .collect();
        Table::new(vec!["x".into(), "y".into()], rows).unwrap()
    }

    fn class_table(n: usize) -> Table {
        let rows = (0..n)
            .map(|i| {
                let a = i as f64;
                let label = (i % 3) as f64;
                vec![Value::Number(a), Value::Number(label * 10.0 + a * 0.01), Value::Number(label)]
            })
            .collect();
        Table::new(vec!["a".into(), "b".into(), "label".into()], rows).unwrap()
    }

    #[test]
    fn test_linear_regression_run() {
        let s = split(&linear_table(), 0.25, 42).unwrap();
        let config = TrainingConfig::new(ModelType::LinearRegression, "y").with_features(["x"]);
        let outcome = TrainEngine::new(config).train(&s).unwrap();

        let r2 = outcome.test_metrics.as_regression().unwrap().r2.unwrap();
        assert!((r2 - 1.0).abs() < 1e-9);
        assert!(outcome.feature_importance.is_empty());
        assert_eq!(outcome.predictions_sample.len(), 5);
        assert!(outcome.training_time_ms >= 0.0);
    }

    #[test]
    fn test_tree_multiclass_run() {
        let s = split(&class_table(60), 0.2, 1).unwrap();
        let config = TrainingConfig::new(ModelType::DecisionTree, "label")
            .with_task(TaskType::Classification)
            .with_features(["a", "b"]);
        let outcome = TrainEngine::new(config).train(&s).unwrap();

        let report = outcome.multiclass.as_ref().unwrap();
        assert_eq!(report.test.accuracy, 1.0);
        assert_eq!(outcome.feature_importance.len(), 2);
        assert_eq!(outcome.feature_importance[0].feature, "a");
    }

    #[test]
    fn test_binary_labels_other_than_zero_one() {
        // Labels 1 and 2; a depth-0 tree predicts the majority label everywhere
        let rows = (0..100)
            .map(|i| {
                let x = i as f64;
                let label = if i < 50 { 1.0 } else { 2.0 };
                vec![Value::Number(x), Value::Number(label)]
            })
            .collect();
        let table = Table::new(vec!["x".into(), "label".into()], rows).unwrap();
        let s = split(&table, 0.2, 42).unwrap();

        let config = TrainingConfig::new(ModelType::DecisionTree, "label")
            .with_task(TaskType::Classification)
            .with_features(["x"])
            .with_hyperparameters(Hyperparameters::default().with_max_depth(0));
        let outcome = TrainEngine::new(config).train(&s).unwrap();

        let test_ones = s.test.rows().iter().filter(|r| r[1] == Value::Number(1.0)).count();
        let test_twos = s.test.n_rows() - test_ones;
        let m = outcome.test_metrics.as_classification().unwrap();
        assert_eq!(m.confusion.total(), 20);
        assert_eq!(m.confusion.tp + m.confusion.fn_, test_twos);
        assert_eq!(m.confusion.tn + m.confusion.fp, test_ones);
        assert!(m.accuracy < 1.0 || test_ones == 0 || test_twos == 0);

        // Deeper tree separates the classes exactly
        let config = TrainingConfig::new(ModelType::DecisionTree, "label")
            .with_task(TaskType::Classification)
            .with_features(["x"]);
        let outcome = TrainEngine::new(config).train(&s).unwrap();
        let m = outcome.test_metrics.as_classification().unwrap();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.confusion.tp, test_twos);
        assert_eq!(m.confusion.tn, test_ones);
    }

    #[test]
    fn test_continuous_target_gets_regression_hint() {
        let s = split(&linear_table(), 0.25, 42).unwrap();
        let config = TrainingConfig::new(ModelType::RandomForest, "y")
            .with_task(TaskType::Classification)
            .with_features(["x"])
            .with_hyperparameters(Hyperparameters::default().with_n_trees(3));
        let err = TrainEngine::new(config).train(&s).unwrap_err();
        assert!(err.to_string().contains("looks like regression"));
    }

    #[test]
    fn test_unknown_feature_is_a_config_error() {
        let s = split(&linear_table(), 0.25, 42).unwrap();
        let config = TrainingConfig::new(ModelType::LinearRegression, "y").with_features(["nope"]);
        let err = TrainEngine::new(config).train(&s).unwrap_err();
        assert!(matches!(err, TabulaError::ColumnNotFound(_)));
    }
}
