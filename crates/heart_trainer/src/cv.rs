//! Cross validation and forest grid search

use heartwise_core::{Classifier, GridSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::errors::{Result, TrainerError};
use crate::forest::ForestParams;
use crate::metrics::accuracy;
use crate::trainer::fit_forest_pipeline;

/// Mean held-out accuracy over stratified folds
///
/// `fit` is called once per fold with the fold's training rows.
pub fn cross_val_accuracy<C, F>(dataset: &Dataset, folds: usize, mut fit: F) -> Result<f64>
where
    C: Classifier,
    F: FnMut(&Dataset) -> Result<C>,
{
    let assignments = dataset.stratified_folds(folds)?;
    let mut total = 0.0;

    for held_out in &assignments {
        let train = dataset.subset(&dataset.complement(held_out));
        let test = dataset.subset(held_out);
        let model = fit(&train)?;
        total += accuracy(&test.targets, &model.predict(&test.features));
    }

    Ok(total / assignments.len() as f64)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridScore {
    pub params: ForestParams,
    pub mean_accuracy: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub best_params: ForestParams,
    pub best_score: f64,
    pub scores: Vec<GridScore>,
}

/// Exhaustive search over forest hyperparameters scored by CV accuracy
#[derive(Clone, Debug, PartialEq)]
pub struct GridSearch {
    pub candidates: Vec<ForestParams>,
    pub folds: usize,
    pub seed: u64,
}

impl GridSearch {
    /// Candidates ordered by depth, then split threshold, then tree count
    pub fn from_settings(grid: &GridSettings, folds: usize, seed: u64) -> Self {
        let mut candidates = Vec::new();
        for max_depth in grid.depth_candidates() {
            for &min_samples_split in &grid.min_samples_split {
                for &n_estimators in &grid.n_estimators {
                    candidates.push(ForestParams {
                        n_estimators,
                        max_depth,
                        min_samples_split,
                    });
                }
            }
        }
        Self {
            candidates,
            folds,
            seed,
        }
    }

    /// Score every candidate; the first candidate with the top score wins
    pub fn run(&self, train: &Dataset) -> Result<GridSearchResult> {
        if self.candidates.is_empty() {
            return Err(TrainerError::Training("grid has no candidates".to_string()));
        }

        let mut scores = Vec::with_capacity(self.candidates.len());
        let mut best: Option<(ForestParams, f64)> = None;

        for params in &self.candidates {
            let mean_accuracy = cross_val_accuracy(train, self.folds, |fold| {
                fit_forest_pipeline(fold, params, self.seed)
            })?;
            debug!(?params, mean_accuracy, "grid candidate scored");

            if best.map_or(true, |(_, score)| mean_accuracy > score) {
                best = Some((*params, mean_accuracy));
            }
            scores.push(GridScore {
                params: *params,
                mean_accuracy,
            });
        }

        let (best_params, best_score) = best
            .ok_or_else(|| TrainerError::Training("grid search produced no score".to_string()))?;
        info!(?best_params, best_score, "grid search finished");

        Ok(GridSearchResult {
            best_params,
            best_score,
            scores,
        })
    }
}
