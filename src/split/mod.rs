//! Seeded train/test splitting
//!
//! The shuffle is driven by a 64-bit linear congruential generator rather
//! than a host RNG, so a given seed yields the same partition on every
//! platform and every release.

use crate::data::Table;
use crate::error::{Result, TabulaError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Rows included in each split preview
pub const SPLIT_PREVIEW_ROWS: usize = 5;

const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// Linear congruential pseudo-random sequence (Knuth's MMIX constants)
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state
    }

    /// Uniform value in `[0, 1)` built from the top 53 bits
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Fisher–Yates permutation of `0..n` driven by [`Lcg`]
pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = Lcg::new(seed);
    for i in (1..n).rev() {
        let j = ((rng.next_f64() * (i + 1) as f64) as usize).min(i);
        indices.swap(i, j);
    }
    indices
}

/// Split configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Share of rows assigned to the test set, in `(0, 1)`
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn new(test_fraction: f64, seed: u64) -> Self {
        Self { test_fraction, seed }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(TabulaError::invalid_parameter(
                "test_fraction",
                self.test_fraction,
                "must lie strictly between 0 and 1",
            ));
        }
        Ok(())
    }
}

/// A train/test partition of a source table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Split {
    pub train: Table,
    pub test: Table,
    pub test_fraction: f64,
    pub seed: u64,
    /// Source row indices of the train rows, in shuffled order
    pub train_indices: Vec<usize>,
    /// Source row indices of the test rows, in shuffled order
    pub test_indices: Vec<usize>,
}

/// Caller-facing view of a split
#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    pub train_count: usize,
    pub test_count: usize,
    pub train_preview: Table,
    pub test_preview: Table,
}

impl Split {
    pub fn summary(&self) -> SplitSummary {
        SplitSummary {
            train_count: self.train.n_rows(),
            test_count: self.test.n_rows(),
            train_preview: self.train.head(SPLIT_PREVIEW_ROWS),
            test_preview: self.test.head(SPLIT_PREVIEW_ROWS),
        }
    }
}

/// Shuffle `table` with `seed` and cut it into train and test sets.
///
/// Rows `[0, floor(n * (1 - test_fraction)))` of the shuffled order form the
/// train set. An empty side is reported as `DegenerateSplit`.
pub fn split(table: &Table, test_fraction: f64, seed: u64) -> Result<Split> {
    SplitConfig::new(test_fraction, seed).validate()?;

    let n = table.n_rows();
    let boundary = ((n as f64) * (1.0 - test_fraction)).floor() as usize;
    let boundary = boundary.min(n);

    if boundary == 0 || boundary == n {
        return Err(TabulaError::DegenerateSplit {
            n_rows: n,
            test_fraction,
            train_count: boundary,
            test_count: n - boundary,
        });
    }

    let order = shuffled_indices(n, seed);
    let (train_idx, test_idx) = order.split_at(boundary);

    info!(
        rows = n,
        train = train_idx.len(),
        test = test_idx.len(),
        seed,
        "Split dataset"
    );

    Ok(Split {
        train: table.select_rows(train_idx),
        test: table.select_rows(test_idx),
        test_fraction,
        seed,
        train_indices: train_idx.to_vec(),
        test_indices: test_idx.to_vec(),
    })
}
