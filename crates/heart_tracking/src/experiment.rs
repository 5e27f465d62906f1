//! Experiment runner
//!
//! Trains a logistic regression run and a random forest run, logging
//! parameters, test metrics, confusion matrix and ROC points, the comparison
//! table, and each fitted model.

use heartwise_core::{FittedPipeline, Settings};
use heartwise_trainer::{
    confusion_matrix, cross_val_accuracy, evaluate, fit_forest_pipeline, fit_logistic_pipeline,
    metrics::scores, roc_curve, ComparisonRow, ComparisonTable, Dataset, ForestParams,
    ModelMetrics, LOGISTIC_REGRESSION, RANDOM_FOREST,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::Result;
use crate::run::ActiveRun;
use crate::store::TrackingStore;

pub const LOGISTIC_REGRESSION_ARTIFACT: &str = "logistic_regression";
pub const RANDOM_FOREST_ARTIFACT: &str = "random_forest";
pub const COMPARISON_ARTIFACT: &str = "model_comparison.csv";

/// Identifiers produced by one experiment
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExperimentOutcome {
    pub experiment_id: String,
    pub log_reg_run_id: String,
    pub random_forest_run_id: String,
    /// Locator of the random forest model
    pub model_uri: String,
    pub comparison_table: ComparisonTable,
}

/// Load and clean the configured CSV, then run the experiment
pub fn run_experiment(settings: &Settings) -> Result<ExperimentOutcome> {
    let dataset = Dataset::from_raw_csv(settings.data.csv_path())?;
    let store = TrackingStore::from_settings(&settings.tracking);
    run_experiment_on(&store, &dataset, settings)
}

pub fn run_experiment_on(
    store: &TrackingStore,
    dataset: &Dataset,
    settings: &Settings,
) -> Result<ExperimentOutcome> {
    let model = &settings.model;
    let (train, test) = dataset.train_test_split(model.test_size, model.random_state)?;
    let experiment = store.get_or_create_experiment(&settings.tracking.experiment_name)?;
    info!(
        experiment = %experiment.name,
        id = %experiment.experiment_id,
        train_rows = train.len(),
        test_rows = test.len(),
        "starting experiment"
    );

    // 1. Logistic regression
    let log_reg = fit_logistic_pipeline(&train, model.logreg_max_iter)?;
    let log_reg_metrics = evaluate(&log_reg, &test);
    let mut run = store.start_run(&experiment, "logistic_regression_run")?;
    let log_reg_run_id = run.run_id().to_string();
    let logged = record_run(
        &mut run,
        &[
            ("model", "Logistic Regression".to_string()),
            ("scaler", "StandardScaler".to_string()),
            ("max_iter", model.logreg_max_iter.to_string()),
        ],
        &log_reg,
        &log_reg_metrics,
        &test,
        LOGISTIC_REGRESSION_ARTIFACT,
    );
    let log_reg_uri = close_run(run, logged)?;
    info!(run_id = %log_reg_run_id, model_uri = %log_reg_uri, "logistic regression run finished");

    // 2. Random forest
    let params = ForestParams {
        n_estimators: model.rf_n_estimators,
        max_depth: model.rf_max_depth,
        min_samples_split: 2,
    };
    let forest = fit_forest_pipeline(&train, &params, model.random_state)?;
    let rf_metrics = evaluate(&forest, &test);

    let comparison = comparison_table(dataset, settings, &params, &log_reg_metrics, &rf_metrics)?;

    let mut run = store.start_run(&experiment, "random_forest_run")?;
    let random_forest_run_id = run.run_id().to_string();
    let logged = record_run(
        &mut run,
        &[
            ("model", "RandomForest".to_string()),
            ("n_estimators", params.n_estimators.to_string()),
            ("max_depth", depth_label(params.max_depth)),
            ("random_state", model.random_state.to_string()),
        ],
        &forest,
        &rf_metrics,
        &test,
        RANDOM_FOREST_ARTIFACT,
    )
    .and_then(|uri| {
        run.log_artifact(COMPARISON_ARTIFACT, comparison.to_csv_string()?.as_bytes())?;
        Ok(uri)
    });
    let model_uri = close_run(run, logged)?;
    info!(run_id = %random_forest_run_id, %model_uri, "random forest run finished");
    info!("model comparison\n{comparison}");

    Ok(ExperimentOutcome {
        experiment_id: experiment.experiment_id,
        log_reg_run_id,
        random_forest_run_id,
        model_uri,
        comparison_table: comparison,
    })
}

/// Log params, metrics, plots data and the model; returns the model locator
fn record_run(
    run: &mut ActiveRun,
    params: &[(&str, String)],
    pipeline: &FittedPipeline,
    metrics: &ModelMetrics,
    test: &Dataset,
    artifact_path: &str,
) -> Result<String> {
    run.log_params(params.iter().map(|(k, v)| (*k, v)))?;
    run.log_metrics(metrics.entries())?;

    let predictions = heartwise_core::Classifier::predict(pipeline, &test.features);
    let matrix = confusion_matrix(&test.targets, &predictions);
    run.log_json_artifact(&format!("{artifact_path}_confusion_matrix.json"), &matrix)?;
    let curve = roc_curve(&test.targets, &scores(pipeline, test, &predictions));
    run.log_json_artifact(&format!("{artifact_path}_roc_curve.json"), &curve)?;

    Ok(run.log_model(artifact_path, pipeline)?.model_uri)
}

/// Mark the run finished or failed depending on `outcome`
fn close_run(run: ActiveRun, outcome: Result<String>) -> Result<String> {
    match outcome {
        Ok(uri) => {
            run.finish()?;
            Ok(uri)
        }
        Err(err) => {
            warn!(run_id = run.run_id(), %err, "run failed");
            run.fail()?;
            Err(err)
        }
    }
}

fn comparison_table(
    dataset: &Dataset,
    settings: &Settings,
    params: &ForestParams,
    log_reg_metrics: &ModelMetrics,
    rf_metrics: &ModelMetrics,
) -> Result<ComparisonTable> {
    let model = &settings.model;
    let log_reg_cv = cross_val_accuracy(dataset, model.cv_folds, |fold| {
        fit_logistic_pipeline(fold, model.logreg_max_iter)
    })?;
    let rf_cv = cross_val_accuracy(dataset, model.cv_folds, |fold| {
        fit_forest_pipeline(fold, params, model.random_state)
    })?;

    let mut table = ComparisonTable::default();
    table.push(ComparisonRow::new(LOGISTIC_REGRESSION, log_reg_metrics, log_reg_cv));
    table.push(ComparisonRow::new(RANDOM_FOREST, rf_metrics, rf_cv));
    Ok(table)
}

fn depth_label(depth: Option<usize>) -> String {
    depth.map_or_else(|| "None".to_string(), |d| d.to_string())
}
