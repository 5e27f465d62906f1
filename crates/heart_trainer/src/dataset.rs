//! Numeric training dataset
//!
//! Built from a cleaned table; provides the deterministic train/test split and
//! stratified folds used for cross validation.

use crate::deterministic::LcgRng;
use crate::errors::{Result, TrainerError};
use heartwise_data::{clean_dataset, CleanTable, RawTable};
use std::path::Path;

/// Feature rows with binary targets
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<u8>,
    pub feature_count: usize,
}

impl Dataset {
    pub fn new(features: Vec<Vec<f64>>, targets: Vec<u8>) -> Result<Self> {
        if features.len() != targets.len() {
            return Err(TrainerError::Dataset(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        let feature_count = features.first().map(Vec::len).unwrap_or_default();
        if let Some(row) = features.iter().position(|r| r.len() != feature_count) {
            return Err(TrainerError::Dataset(format!(
                "row {row}: expected {feature_count} features"
            )));
        }
        Ok(Self {
            features,
            targets,
            feature_count,
        })
    }

    pub fn from_clean(table: &CleanTable) -> Result<Self> {
        Self::new(table.features(), table.targets())
    }

    /// Read the raw headerless CSV and clean it
    pub fn from_raw_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = RawTable::from_path(path)?;
        let clean = clean_dataset(&raw)?;
        Self::from_clean(&clean)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of rows per class, `[negatives, positives]`
    pub fn class_counts(&self) -> [usize; 2] {
        let positives = self.targets.iter().filter(|&&t| t == 1).count();
        [self.len() - positives, positives]
    }

    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
            feature_count: self.feature_count,
        }
    }

    /// Shuffle with `seed` and hold out `ceil(len * test_size)` rows for testing
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(TrainerError::Dataset(format!(
                "test size must lie in (0, 1), got {test_size}"
            )));
        }
        let n = self.len();
        let n_test = (n as f64 * test_size).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(TrainerError::Dataset(format!(
                "cannot split {n} rows with test size {test_size}"
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        LcgRng::new(seed).shuffle(&mut indices);
        let (test, train) = indices.split_at(n_test);

        Ok((self.subset(train), self.subset(test)))
    }

    /// Stratified k-fold assignment: each class is dealt round-robin over the
    /// folds in row order. Returns the held-out indices of each fold.
    pub fn stratified_folds(&self, k: usize) -> Result<Vec<Vec<usize>>> {
        if k < 2 {
            return Err(TrainerError::Dataset(format!(
                "cross validation needs at least 2 folds, got {k}"
            )));
        }
        if k > self.len() {
            return Err(TrainerError::Dataset(format!(
                "cannot build {k} folds from {} rows",
                self.len()
            )));
        }

        let mut folds = vec![Vec::new(); k];
        let mut next = 0usize;
        for class in [0u8, 1u8] {
            for (i, _) in self.targets.iter().enumerate().filter(|&(_, &t)| t == class) {
                folds[next % k].push(i);
                next += 1;
            }
        }
        for fold in &mut folds {
            fold.sort_unstable();
        }
        Ok(folds)
    }

    /// Complement of a held-out fold
    pub fn complement(&self, held_out: &[usize]) -> Vec<usize> {
        let mut mask = vec![false; self.len()];
        for &i in held_out {
            mask[i] = true;
        }
        (0..self.len()).filter(|&i| !mask[i]).collect()
    }
}
