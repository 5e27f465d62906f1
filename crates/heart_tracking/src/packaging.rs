//! Production packaging
//!
//! Refits a random forest on the training split and replaces the fixed
//! production model directory with it.

use heartwise_core::{ModelArtifact, ModelSettings, SavedModel, Settings};
use heartwise_trainer::{evaluate, fit_forest_pipeline, Dataset, ForestParams};
use std::fs;
use tracing::info;

use crate::errors::{Result, TrackingError};

pub const PRODUCTION_N_ESTIMATORS: usize = 100;

/// Forest parameters used for the production model
pub fn production_params(settings: &ModelSettings) -> ForestParams {
    ForestParams {
        n_estimators: PRODUCTION_N_ESTIMATORS,
        max_depth: None,
        min_samples_split: settings.rf_min_samples_split,
    }
}

/// Clean the configured CSV, train and save the production model
pub fn save_final_model(settings: &Settings) -> Result<SavedModel> {
    let dataset = Dataset::from_raw_csv(settings.data.csv_path())?;
    package_model(&dataset, &settings.model)
}

pub fn package_model(dataset: &Dataset, settings: &ModelSettings) -> Result<SavedModel> {
    let (train, test) = dataset.train_test_split(settings.test_size, settings.random_state)?;
    let params = production_params(settings);
    let pipeline = fit_forest_pipeline(&train, &params, settings.random_state)?;
    let metrics = evaluate(&pipeline, &test);
    info!(
        n_estimators = params.n_estimators,
        min_samples_split = params.min_samples_split,
        accuracy = metrics.accuracy,
        "production model trained"
    );

    let dir = &settings.production_model_dir;
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| TrackingError::io(dir, e))?;
    }
    let saved = ModelArtifact::new(pipeline).save(dir)?;
    info!(path = %saved.model_path.display(), hash = %saved.hash, "production model saved");
    Ok(saved)
}
