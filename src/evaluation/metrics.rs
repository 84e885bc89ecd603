//! Evaluation metrics

use crate::error::{Result, TabulaError};
use crate::training::TaskType;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::warn;

/// Binary label coercion: a value is the positive class iff it is `>= 0.5`
#[inline]
pub fn is_positive(v: f64) -> bool {
    v >= 0.5
}

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(TabulaError::EvaluationError(format!(
            "{} labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(TabulaError::EvaluationError(
            "Cannot evaluate an empty set".to_string(),
        ));
    }
    Ok(())
}

#[inline]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[inline]
fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// Regression metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// `None` when the true values have zero variance
    pub r2: Option<f64>,
}

impl RegressionMetrics {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        check_lengths(y_true, y_pred)?;

        let n = y_true.len() as f64;
        let errors = y_true - y_pred;
        let mse = errors.mapv(|e| e * e).sum() / n;
        let mae = errors.mapv(f64::abs).sum() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res = mse * n;

        let r2 = if ss_tot > 0.0 {
            Some(1.0 - ss_res / ss_tot)
        } else {
            warn!(rows = y_true.len(), "R² is undefined for a constant target");
            None
        };

        Ok(Self {
            mae,
            mse,
            rmse: mse.sqrt(),
            r2,
        })
    }
}

/// Binary confusion counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryConfusion {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

impl BinaryConfusion {
    pub fn from_labels(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut c = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (is_positive(t), is_positive(p)) {
                (true, true) => c.tp += 1,
                (false, false) => c.tn += 1,
                (false, true) => c.fp += 1,
                (true, false) => c.fn_ += 1,
            }
        }
        c
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }
}

/// Binary classification metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: BinaryConfusion,
}

impl ClassificationMetrics {
    /// Metrics over labels coerced with [`is_positive`].
    ///
    /// Zero denominators yield 0; an all-zero confusion matrix is an error.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(TabulaError::EvaluationError(format!(
                "{} labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        Self::from_confusion(BinaryConfusion::from_labels(y_true, y_pred))
    }

    pub fn from_confusion(c: BinaryConfusion) -> Result<Self> {
        if c.total() == 0 {
            return Err(TabulaError::EvaluationError(
                "Confusion matrix is empty; no labelled predictions to score".to_string(),
            ));
        }
        let precision = ratio(c.tp, c.tp + c.fp);
        let recall = ratio(c.tp, c.tp + c.fn_);
        Ok(Self {
            accuracy: ratio(c.tp + c.tn, c.total()),
            precision,
            recall,
            f1: f1(precision, recall),
            confusion: c,
        })
    }
}

/// Macro-averaged metrics over every observed class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MulticlassMetrics {
    /// Observed classes (true or predicted), ascending
    pub classes: Vec<String>,
    /// `confusion[i][j]` counts rows of class `i` predicted as class `j`
    pub confusion: Vec<Vec<usize>>,
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
}

impl MulticlassMetrics {
    pub fn compute<L>(y_true: &[L], y_pred: &[L]) -> Result<Self>
    where
        L: PartialOrd + Clone + Display,
    {
        if y_true.len() != y_pred.len() {
            return Err(TabulaError::EvaluationError(format!(
                "{} labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        if y_true.is_empty() {
            return Err(TabulaError::EvaluationError(
                "Cannot evaluate an empty set".to_string(),
            ));
        }

        let mut classes: Vec<L> = y_true.iter().chain(y_pred).cloned().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        classes.dedup_by(|a, b| a == b);

        let index_of = |label: &L| classes.iter().position(|c| c == label).unwrap_or(0);
        let k = classes.len();
        let mut confusion = vec![vec![0usize; k]; k];
        for (t, p) in y_true.iter().zip(y_pred) {
            confusion[index_of(t)][index_of(p)] += 1;
        }

        let correct: usize = (0..k).map(|i| confusion[i][i]).sum();
        let mut precision_sum = 0.0;
        let mut recall_sum = 0.0;
        let mut f1_sum = 0.0;
        for i in 0..k {
            let tp = confusion[i][i];
            let predicted: usize = (0..k).map(|r| confusion[r][i]).sum();
            let actual: usize = confusion[i].iter().sum();
            let p = ratio(tp, predicted);
            let r = ratio(tp, actual);
            precision_sum += p;
            recall_sum += r;
            f1_sum += f1(p, r);
        }

        Ok(Self {
            classes: classes.iter().map(ToString::to_string).collect(),
            confusion,
            accuracy: ratio(correct, y_true.len()),
            macro_precision: precision_sum / k as f64,
            macro_recall: recall_sum / k as f64,
            macro_f1: f1_sum / k as f64,
        })
    }
}

/// Metrics for one evaluated set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metrics {
    Regression(RegressionMetrics),
    Classification(ClassificationMetrics),
}

impl Metrics {
    pub fn as_regression(&self) -> Option<&RegressionMetrics> {
        match self {
            Metrics::Regression(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_classification(&self) -> Option<&ClassificationMetrics> {
        match self {
            Metrics::Classification(m) => Some(m),
            _ => None,
        }
    }
}

/// Score predictions for `task`
pub fn evaluate(task: TaskType, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Metrics> {
    match task {
        TaskType::Regression => RegressionMetrics::compute(y_true, y_pred).map(Metrics::Regression),
        TaskType::Classification => {
            ClassificationMetrics::compute(y_true, y_pred).map(Metrics::Classification)
        }
    }
}
