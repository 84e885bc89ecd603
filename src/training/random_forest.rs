//! Random Forest implementation

use super::config::TaskType;
use super::decision_tree::{check_multiple_classes, majority_label, DecisionTree};
use super::models::{check_fit_inputs, check_predict_inputs};
use crate::error::{Result, TabulaError};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub task: TaskType,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples: usize,
    /// Fit each tree on a resample drawn with replacement
    pub bootstrap: bool,
    /// Tree `i` draws its resample from a stream seeded with `seed + i`
    pub seed: u64,
    n_features: usize,
}

impl RandomForest {
    pub fn new(task: TaskType, n_trees: usize) -> Self {
        Self {
            trees: Vec::new(),
            task,
            n_trees,
            max_depth: 10,
            min_samples: 2,
            bootstrap: true,
            seed: 42,
            n_features: 0,
        }
    }

    pub fn new_classifier(n_trees: usize) -> Self {
        Self::new(TaskType::Classification, n_trees)
    }

    pub fn new_regressor(n_trees: usize) -> Self {
        Self::new(TaskType::Regression, n_trees)
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
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

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fit `n_trees` trees in parallel.
    ///
    /// Input checks (including the two-class requirement) run once on the
    /// full training set; a bootstrap resample may legitimately hold a
    /// single class.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_inputs(x, y)?;
        if self.task == TaskType::Classification {
            check_multiple_classes(y)?;
        }
        if self.n_trees == 0 {
            return Err(TabulaError::invalid_parameter(
                "n_trees",
                self.n_trees,
                "a forest needs at least one tree",
            ));
        }

        let n_samples = x.nrows();
        let template = DecisionTree::new(self.task)
            .with_max_depth(self.max_depth)
            .with_min_samples(self.min_samples);

        let trees: Vec<DecisionTree> = (0..self.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let indices: Vec<usize> = if self.bootstrap {
                    let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = template.clone();
                tree.grow(x, y, indices);
                tree
            })
            .collect();

        debug!(
            n_trees = trees.len(),
            bootstrap = self.bootstrap,
            "Fitted random forest"
        );

        self.n_features = x.ncols();
        self.trees = trees;
        Ok(self)
    }

    /// Majority vote (classification) or mean (regression) across trees
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(TabulaError::ModelNotFitted);
        }
        check_predict_inputs(x, self.n_features)?;

        let per_tree = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let n_trees = per_tree.len() as f64;
        let predictions = (0..x.nrows())
            .map(|i| {
                let votes: Vec<f64> = per_tree.iter().map(|p| p[i]).collect();
                match self.task {
                    TaskType::Classification => majority_label(&votes),
                    TaskType::Regression => votes.iter().sum::<f64>() / n_trees,
                }
            })
            .collect();

        Ok(predictions)
    }
}
