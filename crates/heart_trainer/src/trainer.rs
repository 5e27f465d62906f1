//! Model training and comparison
//!
//! Fits a scaled logistic regression and a grid-searched random forest on a
//! deterministic train split, evaluates both on the held-out split and
//! reports cross-validated accuracy over the whole dataset.

use heartwise_core::{
    Estimator, FittedPipeline, ModelSettings, StandardScaler,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::comparison::{ComparisonRow, ComparisonTable};
use crate::cv::{cross_val_accuracy, GridSearch, GridSearchResult};
use crate::dataset::Dataset;
use crate::errors::Result;
use crate::forest::{fit_forest, ForestParams};
use crate::logistic::{fit_logistic, LogisticConfig};
use crate::metrics::evaluate;

pub const LOGISTIC_REGRESSION: &str = "Logistic Regression";
pub const RANDOM_FOREST: &str = "Random Forest";

/// Training configuration
#[derive(Clone, Debug, PartialEq)]
pub struct TrainerConfig {
    pub test_size: f64,
    pub seed: u64,
    pub cv_folds: usize,
    pub logreg_max_iter: usize,
    /// Search the grid; otherwise fit `forest` directly
    pub grid_search: bool,
    pub grid: GridSearch,
    pub forest: ForestParams,
}

impl TrainerConfig {
    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self {
            test_size: settings.test_size,
            seed: settings.random_state,
            cv_folds: settings.cv_folds,
            logreg_max_iter: settings.logreg_max_iter,
            grid_search: true,
            grid: GridSearch::from_settings(&settings.grid, settings.cv_folds, settings.random_state),
            forest: ForestParams {
                n_estimators: settings.rf_n_estimators,
                max_depth: settings.rf_max_depth,
                min_samples_split: settings.rf_min_samples_split,
            },
        }
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self::from_settings(&ModelSettings::default())
    }
}

/// Everything produced by one training run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub log_reg_model: FittedPipeline,
    pub random_forest_model: FittedPipeline,
    pub comparison_table: ComparisonTable,
    pub best_params: ForestParams,
    pub grid: Option<GridSearchResult>,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Standard scaling followed by logistic regression
pub fn fit_logistic_pipeline(train: &Dataset, max_iter: usize) -> Result<FittedPipeline> {
    let scaler = StandardScaler::fit(&train.features)?;
    let scaled = scaler.transform(&train.features);
    let config = LogisticConfig {
        max_iter,
        ..LogisticConfig::default()
    };
    let model = fit_logistic(&scaled, &train.targets, &config)?;
    Ok(FittedPipeline::new(
        Some(scaler),
        Estimator::LogisticRegression(model),
    ))
}

/// Standard scaling followed by a random forest
pub fn fit_forest_pipeline(
    train: &Dataset,
    params: &ForestParams,
    seed: u64,
) -> Result<FittedPipeline> {
    let scaler = StandardScaler::fit(&train.features)?;
    let scaled = Dataset {
        features: scaler.transform(&train.features),
        targets: train.targets.clone(),
        feature_count: train.feature_count,
    };
    let forest = fit_forest(&scaled, params, seed)?;
    Ok(FittedPipeline::new(
        Some(scaler),
        Estimator::RandomForest(forest),
    ))
}

/// Train both candidate models and build the comparison table
pub fn train_models(dataset: &Dataset, config: &TrainerConfig) -> Result<TrainingReport> {
    let (train, test) = dataset.train_test_split(config.test_size, config.seed)?;
    info!(
        train_rows = train.len(),
        test_rows = test.len(),
        "dataset split"
    );

    // 1. Logistic regression
    let log_reg_model = fit_logistic_pipeline(&train, config.logreg_max_iter)?;
    let log_reg_metrics = evaluate(&log_reg_model, &test);
    let log_reg_cv = cross_val_accuracy(dataset, config.cv_folds, |fold| {
        fit_logistic_pipeline(fold, config.logreg_max_iter)
    })?;
    info!(accuracy = log_reg_metrics.accuracy, cv_accuracy = log_reg_cv, "logistic regression trained");

    // 2. Random forest, tuned on the training split
    let grid = if config.grid_search {
        Some(config.grid.run(&train)?)
    } else {
        None
    };
    let best_params = grid
        .as_ref()
        .map_or(config.forest, |result| result.best_params);

    let random_forest_model = fit_forest_pipeline(&train, &best_params, config.seed)?;
    let rf_metrics = evaluate(&random_forest_model, &test);
    let rf_cv = cross_val_accuracy(dataset, config.cv_folds, |fold| {
        fit_forest_pipeline(fold, &best_params, config.seed)
    })?;
    info!(?best_params, accuracy = rf_metrics.accuracy, cv_accuracy = rf_cv, "random forest trained");

    let mut comparison_table = ComparisonTable::default();
    comparison_table.push(ComparisonRow::new(LOGISTIC_REGRESSION, &log_reg_metrics, log_reg_cv));
    comparison_table.push(ComparisonRow::new(RANDOM_FOREST, &rf_metrics, rf_cv));
    info!("model comparison\n{comparison_table}");

    Ok(TrainingReport {
        log_reg_model,
        random_forest_model,
        comparison_table,
        best_params,
        grid,
        train_rows: train.len(),
        test_rows: test.len(),
    })
}
