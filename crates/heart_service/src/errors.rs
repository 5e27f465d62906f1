use heartwise_core::CoreError;
use heartwise_tracking::TrackingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Every model source came up empty
    #[error("no model available: pass a model locator, log a model under experiment {experiment:?}, or set MLFLOW_MODEL_URI")]
    NoModel { experiment: String },

    #[error("failed to load model from {locator}: {source}")]
    ModelLoad {
        locator: String,
        #[source]
        source: CoreError,
    },

    #[error("model expects {expected} features, record has {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("model returned no prediction")]
    EmptyPrediction,

    #[error(transparent)]
    Tracking(#[from] TrackingError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
