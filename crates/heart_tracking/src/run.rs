//! Experiment Recorder: parameters, metrics, artifacts and models of one run

use chrono::Utc;
use heartwise_core::{FittedPipeline, ModelArtifact};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{Result, TrackingError};
use crate::store::{
    create_dir, write_json, LoggedModelInfo, RunInfo, RunStatus, TrackingStore, ARTIFACTS_DIR,
    META_FILE, METRICS_FILE, PARAMS_FILE,
};

/// A model logged by a run
#[derive(Clone, Debug, PartialEq)]
pub struct LoggedModel {
    pub model_id: String,
    /// Directory holding `model.json` and `model.hash`
    pub artifact_dir: PathBuf,
    /// `runs:/<run_id>/<artifact_path>`
    pub model_uri: String,
    pub hash: String,
}

/// Run in progress; every log call is persisted immediately
#[derive(Debug)]
pub struct ActiveRun {
    store: TrackingStore,
    info: RunInfo,
    dir: PathBuf,
    params: BTreeMap<String, String>,
    metrics: BTreeMap<String, f64>,
}

impl ActiveRun {
    pub(crate) fn new(store: TrackingStore, info: RunInfo, dir: PathBuf) -> Self {
        Self {
            store,
            info,
            dir,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn info(&self) -> &RunInfo {
        &self.info
    }

    pub fn run_id(&self) -> &str {
        &self.info.run_id
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.dir.join(ARTIFACTS_DIR)
    }

    pub fn log_param(&mut self, key: &str, value: impl Display) -> Result<()> {
        self.params.insert(key.to_string(), value.to_string());
        write_json(&self.dir.join(PARAMS_FILE), &self.params)
    }

    pub fn log_params<I, K, V>(&mut self, params: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Display,
    {
        for (key, value) in params {
            self.params.insert(key.into(), value.to_string());
        }
        write_json(&self.dir.join(PARAMS_FILE), &self.params)
    }

    pub fn log_metric(&mut self, key: &str, value: f64) -> Result<()> {
        self.metrics.insert(key.to_string(), value);
        write_json(&self.dir.join(METRICS_FILE), &self.metrics)
    }

    pub fn log_metrics<'a, I>(&mut self, metrics: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        for (key, value) in metrics {
            if value.is_nan() {
                warn!(metric = key, "metric is NaN");
            }
            self.metrics.insert(key.to_string(), value);
        }
        write_json(&self.dir.join(METRICS_FILE), &self.metrics)
    }

    /// Write raw bytes under the run's artifact directory
    pub fn log_artifact(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.artifacts_dir().join(name);
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        fs::write(&path, content).map_err(|e| TrackingError::io(&path, e))?;
        Ok(path)
    }

    pub fn log_json_artifact<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let json = serde_json::to_vec_pretty(value)?;
        self.log_artifact(name, &json)
    }

    /// Persist a fitted pipeline as a logged model of this run
    pub fn log_model(&mut self, artifact_path: &str, pipeline: &FittedPipeline) -> Result<LoggedModel> {
        let model_id = format!("m-{}", Uuid::new_v4().simple());
        let model_dir = self
            .store
            .model_dir(&self.info.experiment_id, &model_id);
        let artifact_dir = model_dir.join(ARTIFACTS_DIR);

        let saved = ModelArtifact::new(pipeline.clone()).save(&artifact_dir)?;
        let logged = LoggedModelInfo {
            model_id: model_id.clone(),
            run_id: self.info.run_id.clone(),
            experiment_id: self.info.experiment_id.clone(),
            artifact_path: artifact_path.to_string(),
            model_hash: saved.hash.clone(),
            created_at: Utc::now(),
        };
        write_json(&model_dir.join(META_FILE), &logged)?;

        self.info
            .models
            .insert(artifact_path.to_string(), model_id.clone());
        self.write_meta()?;

        let model_uri = format!("runs:/{}/{}", self.info.run_id, artifact_path);
        info!(%model_uri, model_id = %model_id, "model logged");
        Ok(LoggedModel {
            model_id,
            artifact_dir,
            model_uri,
            hash: saved.hash,
        })
    }

    pub fn finish(self) -> Result<RunInfo> {
        self.end(RunStatus::Finished)
    }

    pub fn fail(self) -> Result<RunInfo> {
        self.end(RunStatus::Failed)
    }

    fn end(mut self, status: RunStatus) -> Result<RunInfo> {
        self.info.status = status;
        self.info.end_time = Some(Utc::now());
        self.write_meta()?;
        Ok(self.info)
    }

    fn write_meta(&self) -> Result<()> {
        write_json(&self.dir.join(META_FILE), &self.info)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
