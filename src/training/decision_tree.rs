//! Decision tree implementation

use super::config::TaskType;
use super::models::{check_fit_inputs, check_predict_inputs};
use crate::error::{Result, TabulaError};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Smallest impurity decrease that counts as an improvement
const MIN_GAIN: f64 = 1e-12;

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Rows with `x[feature_index] <= threshold` go left
    Split {
        feature_index: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    fn predict(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_index] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// Distinct labels with their counts, ascending by label
fn class_counts(y: &[f64]) -> Vec<(f64, usize)> {
    let mut sorted = y.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for v in sorted {
        match counts.last_mut() {
            Some((label, count)) if *label == v => *count += 1,
            _ => counts.push((v, 1)),
        }
    }
    counts
}

/// Most frequent label; ties go to the smallest label
pub(crate) fn majority_label(y: &[f64]) -> f64 {
    let mut best = (f64::NAN, 0usize);
    for (label, count) in class_counts(y) {
        if count > best.1 {
            best = (label, count);
        }
    }
    best.0
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn variance(sum: f64, sq_sum: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    (sq_sum / n - (sum / n).powi(2)).max(0.0)
}

/// Decision tree for classification (Gini) or regression (variance)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub task: TaskType,
    pub max_depth: usize,
    /// Nodes with fewer samples become leaves
    pub min_samples: usize,
    n_features: usize,
}

impl DecisionTree {
    pub fn new(task: TaskType) -> Self {
        Self {
            root: None,
            task,
            max_depth: 10,
            min_samples: 2,
            n_features: 0,
        }
    }

    pub fn new_classifier() -> Self {
        Self::new(TaskType::Classification)
    }

    pub fn new_regressor() -> Self {
        Self::new(TaskType::Regression)
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Fit the tree on all rows of `x`
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_inputs(x, y)?;
        if self.task == TaskType::Classification {
            check_multiple_classes(y)?;
        }
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.grow(x, y, indices);
        Ok(self)
    }

    /// Build the tree on a (possibly repeated) subset of rows, skipping input checks
    pub(crate) fn grow(&mut self, x: &Array2<f64>, y: &Array1<f64>, indices: Vec<usize>) {
        self.n_features = x.ncols();
        self.root = Some(self.build_node(x, y, indices, 0));
    }

    fn leaf(&self, y_node: &[f64]) -> TreeNode {
        let value = match self.task {
            TaskType::Classification => majority_label(y_node),
            TaskType::Regression => y_node.iter().sum::<f64>() / y_node.len() as f64,
        };
        TreeNode::Leaf {
            value,
            n_samples: y_node.len(),
        }
    }

    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
    ) -> TreeNode {
        let n_samples = indices.len();
        let y_node: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        if n_samples < self.min_samples || depth >= self.max_depth {
            return self.leaf(&y_node);
        }

        let (feature_index, threshold) = match self.find_best_split(x, &y_node, &indices) {
            Some(split) => split,
            None => return self.leaf(&y_node),
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, feature_index]] <= threshold);

        let left = Box::new(self.build_node(x, y, left_indices, depth + 1));
        let right = Box::new(self.build_node(x, y, right_indices, depth + 1));

        TreeNode::Split {
            feature_index,
            threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Best `(feature, threshold)` by impurity decrease.
    ///
    /// Features are scanned in parallel but compared in index order with a
    /// strict `>`, so the first maximum in feature-then-threshold order wins.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y_node: &[f64],
        indices: &[usize],
    ) -> Option<(usize, f64)> {
        let classes: Vec<f64> = match self.task {
            TaskType::Classification => class_counts(y_node).into_iter().map(|(c, _)| c).collect(),
            TaskType::Regression => Vec::new(),
        };
        let parent = self.node_impurity(y_node);

        let per_feature: Vec<Option<(usize, f64, f64)>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature| {
                self.best_threshold(x, y_node, indices, feature, parent, &classes)
                    .map(|(threshold, gain)| (feature, threshold, gain))
            })
            .collect();

        let mut best: Option<(usize, f64, f64)> = None;
        for candidate in per_feature.into_iter().flatten() {
            if best.map_or(true, |b| candidate.2 > b.2) {
                best = Some(candidate);
            }
        }
        best.map(|(feature, threshold, _)| (feature, threshold))
    }

    fn node_impurity(&self, y_node: &[f64]) -> f64 {
        match self.task {
            TaskType::Classification => {
                let counts: Vec<usize> = class_counts(y_node).into_iter().map(|(_, c)| c).collect();
                gini(&counts, y_node.len())
            }
            TaskType::Regression => {
                let sum: f64 = y_node.iter().sum();
                let sq_sum: f64 = y_node.iter().map(|v| v * v).sum();
                variance(sum, sq_sum, y_node.len())
            }
        }
    }

    /// Sweep the midpoints of one feature's sorted unique values
    fn best_threshold(
        &self,
        x: &Array2<f64>,
        y_node: &[f64],
        indices: &[usize],
        feature: usize,
        parent: f64,
        classes: &[f64],
    ) -> Option<(f64, f64)> {
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .zip(y_node)
            .map(|(&i, &yi)| (x[[i, feature]], yi))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        let class_of = |label: f64| classes.iter().position(|&c| c == label).unwrap_or(0);

        let (total_sum, total_sq) = pairs
            .iter()
            .fold((0.0, 0.0), |(s, q), &(_, yi)| (s + yi, q + yi * yi));
        let mut total_counts = vec![0usize; classes.len()];
        if self.task == TaskType::Classification {
            for &(_, yi) in &pairs {
                total_counts[class_of(yi)] += 1;
            }
        }

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        let mut left_counts = vec![0usize; classes.len()];
        let mut best: Option<(f64, f64)> = None;

        for i in 0..n.saturating_sub(1) {
            let (value, yi) = pairs[i];
            left_sum += yi;
            left_sq += yi * yi;
            if self.task == TaskType::Classification {
                left_counts[class_of(yi)] += 1;
            }

            let next = pairs[i + 1].0;
            if next == value {
                continue;
            }

            let n_left = i + 1;
            let n_right = n - n_left;
            let (left_imp, right_imp) = match self.task {
                TaskType::Classification => {
                    let right_counts: Vec<usize> = total_counts
                        .iter()
                        .zip(&left_counts)
                        .map(|(t, l)| t - l)
                        .collect();
                    (gini(&left_counts, n_left), gini(&right_counts, n_right))
                }
                TaskType::Regression => (
                    variance(left_sum, left_sq, n_left),
                    variance(total_sum - left_sum, total_sq - left_sq, n_right),
                ),
            };

            let weighted = (n_left as f64 * left_imp + n_right as f64 * right_imp) / n as f64;
            let gain = parent - weighted;
            if gain > MIN_GAIN && best.map_or(true, |(_, g)| gain > g) {
                best = Some(((value + next) / 2.0, gain));
            }
        }

        best
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(TabulaError::ModelNotFitted)?;
        check_predict_inputs(x, self.n_features)?;
        Ok(x.outer_iter().map(|row| root.predict(row)).collect())
    }
}

/// Classification targets need at least two distinct labels
pub(crate) fn check_multiple_classes(y: &Array1<f64>) -> Result<()> {
    let labels = y.to_vec();
    let counts = class_counts(&labels);
    if counts.len() < 2 {
        let label = counts.first().map(|(l, _)| *l).unwrap_or(f64::NAN);
        return Err(TabulaError::DataError(format!(
            "Target has a single class ({}); classification needs at least two",
            label
        )));
    }
    Ok(())
}
