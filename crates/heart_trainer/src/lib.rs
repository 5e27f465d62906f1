//! Heartwise trainer - deterministic classifier training
//!
//! Fits the logistic regression and random forest pipelines, tunes the forest
//! by cross-validated grid search and compares both on a held-out split.
//! Every random choice is driven by a seeded generator so runs reproduce.

pub mod cart;
pub mod comparison;
pub mod cv;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod forest;
pub mod logistic;
pub mod metrics;
pub mod trainer;

use heartwise_core::ModelSettings;
use std::path::Path;

pub use comparison::{ComparisonRow, ComparisonTable, METRIC_COLUMNS};
pub use cv::{cross_val_accuracy, GridScore, GridSearch, GridSearchResult};
pub use dataset::Dataset;
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::{Result, TrainerError};
pub use forest::{fit_forest, ForestParams};
pub use logistic::{fit_logistic, LogisticConfig};
pub use metrics::{
    confusion_matrix, evaluate, roc_auc, roc_curve, ConfusionMatrix, ModelMetrics, RocPoint,
};
pub use trainer::{
    fit_forest_pipeline, fit_logistic_pipeline, train_models, TrainerConfig, TrainingReport,
    LOGISTIC_REGRESSION, RANDOM_FOREST,
};

/// Clean the raw CSV at `path` and train both models with `settings`
pub fn train_models_from_csv(path: &Path, settings: &ModelSettings) -> Result<TrainingReport> {
    let dataset = Dataset::from_raw_csv(path)?;
    train_models(&dataset, &TrainerConfig::from_settings(settings))
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
