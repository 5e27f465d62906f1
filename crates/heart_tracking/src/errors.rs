use heartwise_core::CoreError;
use heartwise_data::DataError;
use heartwise_trainer::TrainerError;
use thiserror::Error;

/// Errors raised by the tracking store and the experiment runner
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("run {run_id} has no model at {artifact_path}")]
    ModelNotFound { run_id: String, artifact_path: String },

    #[error("invalid model locator {0:?}")]
    InvalidLocator(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Trainer(#[from] TrainerError),
}

impl TrackingError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        TrackingError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackingError>;
