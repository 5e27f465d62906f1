//! Random forest fitting
//!
//! Each tree is grown on a bootstrap sample and examines `sqrt(features)`
//! candidate features per split, drawing from its own RNG stream.

use heartwise_core::RandomForest;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::Dataset;
use crate::deterministic::LcgRng;
use crate::errors::{Result, TrainerError};

/// Forest hyperparameters searched by the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl ForestParams {
    fn tree_config(&self, feature_count: usize) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: 1,
            max_features: Some(max_features(feature_count)),
        }
    }
}

/// `floor(sqrt(n))`, at least one
pub fn max_features(feature_count: usize) -> usize {
    ((feature_count as f64).sqrt().floor() as usize).max(1)
}

pub fn fit_forest(dataset: &Dataset, params: &ForestParams, seed: u64) -> Result<RandomForest> {
    if dataset.is_empty() {
        return Err(TrainerError::Training("cannot fit a forest on no rows".to_string()));
    }
    if params.n_estimators == 0 {
        return Err(TrainerError::Training("forest needs at least one tree".to_string()));
    }

    let n = dataset.len();
    let builder = CartBuilder::new(
        &dataset.features,
        &dataset.targets,
        params.tree_config(dataset.feature_count),
    );

    let trees = (0..params.n_estimators)
        .map(|t| {
            let mut rng = LcgRng::derive(seed, t as u64);
            let sample: Vec<usize> = (0..n).map(|_| rng.next_below(n)).collect();
            builder.build(&sample, &mut rng)
        })
        .collect::<Vec<_>>();

    debug!(
        trees = trees.len(),
        max_depth = trees.iter().map(|t| t.depth()).max().unwrap_or_default(),
        "forest fitted"
    );

    Ok(RandomForest {
        trees,
        feature_count: dataset.feature_count,
    })
}
