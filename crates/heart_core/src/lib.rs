//! Heartwise core
//!
//! Shared building blocks for the heart-disease pipeline:
//! - Environment-driven configuration
//! - Patient record and prediction types
//! - Classifier model representation (scaler, logistic regression, forest)
//! - Model artifact persistence with content hashing
//! - Logging initialisation

pub mod artifact;
pub mod config;
pub mod errors;
pub mod log;
pub mod model;
pub mod serialization;
pub mod types;

pub use artifact::{ModelArtifact, SavedModel, HASH_FILE, MODEL_FILE};
pub use config::{
    ApiSettings, DataSettings, GridSettings, LogFormat, LoggingSettings, ModelSettings, Settings,
    TrackingSettings,
};
pub use errors::{CoreError, Result};
pub use log::init_logging;
pub use model::{
    Classifier, Estimator, FittedPipeline, LogisticRegression, Node, RandomForest,
    StandardScaler, Tree,
};
pub use types::{
    PatientRecord, PredictionResult, CATEGORICAL_COLUMNS, COLUMN_NAMES, FEATURE_COLUMNS,
    FEATURE_COUNT, TARGET_COLUMN,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
