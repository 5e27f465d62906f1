//! Inference Service
//!
//! Holds one loaded model, shared read-only across requests.

use heartwise_core::{Classifier, ModelArtifact, PatientRecord, PredictionResult, Settings};
use heartwise_tracking::{latest_model_uri, run_experiment, ModelLocator, TrackingStore};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::errors::{Result, ServiceError};

/// Where the loaded model came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelSource {
    Explicit,
    Resolver,
    AutoTrain,
    Environment,
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelSource::Explicit => "explicit locator",
            ModelSource::Resolver => "latest logged model",
            ModelSource::AutoTrain => "auto-trained model",
            ModelSource::Environment => "MLFLOW_MODEL_URI",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct InferenceService {
    model: Arc<dyn Classifier>,
    locator: String,
}

impl fmt::Debug for InferenceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceService")
            .field("model", &self.model.name())
            .field("locator", &self.locator)
            .finish()
    }
}

impl InferenceService {
    pub fn new(model: Arc<dyn Classifier>, locator: impl Into<String>) -> Self {
        Self {
            model,
            locator: locator.into(),
        }
    }

    /// Load the model artifact a locator points at
    pub fn load(locator: &str, store: &TrackingStore) -> Result<Self> {
        let path = ModelLocator::parse(locator)?.resolve(store)?;
        let artifact = ModelArtifact::load(&path).map_err(|source| ServiceError::ModelLoad {
            locator: locator.to_string(),
            source,
        })?;
        info!(
            locator,
            estimator = %artifact.estimator,
            created_at = %artifact.created_at,
            "model loaded"
        );
        Ok(Self::new(Arc::new(artifact.pipeline), locator))
    }

    /// Build the service from the first model source that yields a locator
    ///
    /// Order: `explicit`, the newest logged model, one auto-training run when
    /// enabled, then `MLFLOW_MODEL_URI`. The variable is a last resort; it
    /// does not override a model the resolver finds.
    pub fn from_settings(explicit: Option<&str>, settings: &Settings) -> Result<(Self, ModelSource)> {
        let (locator, source) = resolve_locator(explicit, settings)?;
        info!(%locator, %source, "using model");
        let store = TrackingStore::from_settings(&settings.tracking);
        Ok((Self::load(&locator, &store)?, source))
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Score one record; confidence is NaN when the model has no probabilities
    pub fn predict_single(&self, record: &PatientRecord) -> Result<PredictionResult> {
        let expected = self.model.feature_count();
        let row = record.to_features().to_vec();
        if row.len() != expected {
            return Err(ServiceError::FeatureMismatch {
                expected,
                actual: row.len(),
            });
        }
        let rows = [row];

        let prediction = self
            .model
            .predict(&rows)
            .first()
            .copied()
            .ok_or(ServiceError::EmptyPrediction)?;
        let confidence = self
            .model
            .predict_proba(&rows)
            .and_then(|proba| proba.first().copied())
            .unwrap_or(f64::NAN);
        Ok(PredictionResult {
            prediction,
            confidence,
        })
    }
}

fn resolve_locator(explicit: Option<&str>, settings: &Settings) -> Result<(String, ModelSource)> {
    if let Some(locator) = explicit.filter(|l| !l.trim().is_empty()) {
        return Ok((locator.to_string(), ModelSource::Explicit));
    }

    let tracking = &settings.tracking;
    let store = TrackingStore::from_settings(tracking);
    if let Some(uri) = latest_model_uri(&store, &tracking.experiment_name) {
        return Ok((uri, ModelSource::Resolver));
    }

    if tracking.auto_train {
        info!("no logged model found, starting auto-train");
        match run_experiment(settings) {
            Ok(outcome) => {
                info!(model_uri = %outcome.model_uri, "auto-training completed");
                return Ok((outcome.model_uri, ModelSource::AutoTrain));
            }
            Err(err) => error!(%err, "auto-training failed"),
        }
    } else {
        warn!("no logged model found and auto-training is disabled");
    }

    match &tracking.model_uri {
        Some(uri) => Ok((uri.clone(), ModelSource::Environment)),
        None => Err(ServiceError::NoModel {
            experiment: tracking.experiment_name.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartwise_core::{Estimator, FittedPipeline, LogisticRegression, FEATURE_COUNT};

    struct NoProba;

    impl Classifier for NoProba {
        fn feature_count(&self) -> usize {
            FEATURE_COUNT
        }

        fn predict(&self, rows: &[Vec<f64>]) -> Vec<u8> {
            vec![1; rows.len()]
        }
    }

    fn record() -> PatientRecord {
        PatientRecord::from_features(&[
            63.0, 1.0, 3.0, 145.0, 233.0, 1.0, 0.0, 150.0, 0.0, 2.3, 0.0, 0.0, 1.0,
        ])
        .unwrap()
    }

    fn quiet_settings(root: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.tracking.mlruns_dir = root.join("mlruns");
        settings.tracking.auto_train = false;
        settings
    }

    #[test]
    fn confidence_is_nan_without_probabilities() {
        let service = InferenceService::new(Arc::new(NoProba), "memory");
        let result = service.predict_single(&record()).unwrap();
        assert_eq!(result.prediction, 1);
        assert!(!result.has_confidence());
    }

    struct Silent;

    impl Classifier for Silent {
        fn feature_count(&self) -> usize {
            FEATURE_COUNT
        }

        fn predict(&self, _rows: &[Vec<f64>]) -> Vec<u8> {
            Vec::new()
        }
    }

    #[test]
    fn empty_prediction_is_an_error() {
        let service = InferenceService::new(Arc::new(Silent), "memory");
        assert!(matches!(
            service.predict_single(&record()),
            Err(ServiceError::EmptyPrediction)
        ));
    }

    #[test]
    fn logistic_model_reports_probability() {
        let pipeline = FittedPipeline::new(
            None,
            Estimator::LogisticRegression(LogisticRegression {
                coefficients: vec![0.0; FEATURE_COUNT],
                intercept: 2.0,
            }),
        );
        let service = InferenceService::new(Arc::new(pipeline), "memory");
        let result = service.predict_single(&record()).unwrap();
        assert_eq!(result.prediction, 1);
        assert!(result.confidence > 0.85 && result.confidence < 0.9);
    }

    #[test]
    fn logged_model_takes_precedence_over_environment() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = quiet_settings(dir.path());
        settings.tracking.model_uri = Some("file:///from/env".to_string());

        let store = TrackingStore::from_settings(&settings.tracking);
        let experiment = store
            .get_or_create_experiment(&settings.tracking.experiment_name)
            .unwrap();
        let mut run = store.start_run(&experiment, "lr").unwrap();
        let pipeline = FittedPipeline::new(
            None,
            Estimator::LogisticRegression(LogisticRegression {
                coefficients: vec![0.0; FEATURE_COUNT],
                intercept: 0.0,
            }),
        );
        run.log_model("logistic_regression", &pipeline).unwrap();
        run.finish().unwrap();

        let (locator, source) = resolve_locator(None, &settings).unwrap();
        assert_eq!(source, ModelSource::Resolver);
        assert!(locator.ends_with("/artifacts"));
    }

    #[test]
    fn explicit_locator_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = quiet_settings(dir.path());
        settings.tracking.model_uri = Some("file:///from/env".to_string());
        let (locator, source) = resolve_locator(Some("/explicit/model"), &settings).unwrap();
        assert_eq!(locator, "/explicit/model");
        assert_eq!(source, ModelSource::Explicit);
    }

    #[test]
    fn environment_override_is_the_last_resort() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = quiet_settings(dir.path());
        assert!(matches!(
            resolve_locator(None, &settings),
            Err(ServiceError::NoModel { .. })
        ));

        settings.tracking.model_uri = Some("file:///from/env".to_string());
        let (locator, source) = resolve_locator(None, &settings).unwrap();
        assert_eq!(locator, "file:///from/env");
        assert_eq!(source, ModelSource::Environment);
    }
}
