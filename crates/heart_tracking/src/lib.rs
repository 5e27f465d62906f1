//! Heartwise tracking - experiment records, model resolution and packaging
//!
//! Runs are stored as plain directories of JSON files under the tracking
//! root. Logged models live beside the runs so the newest one can be found
//! by modification time alone.

pub mod errors;
pub mod experiment;
pub mod locator;
pub mod packaging;
pub mod resolver;
pub mod run;
pub mod store;

pub use errors::{Result, TrackingError};
pub use experiment::{
    run_experiment, run_experiment_on, ExperimentOutcome, COMPARISON_ARTIFACT,
    LOGISTIC_REGRESSION_ARTIFACT, RANDOM_FOREST_ARTIFACT,
};
pub use locator::ModelLocator;
pub use packaging::{package_model, production_params, save_final_model};
pub use resolver::{latest_model_uri, latest_subdirectory};
pub use run::{ActiveRun, LoggedModel};
pub use store::{file_uri, Experiment, LoggedModelInfo, RunInfo, RunStatus, TrackingStore};
