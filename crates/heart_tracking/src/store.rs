//! File-based tracking store
//!
//! ```text
//! <root>/<experiment_id>/meta.json
//! <root>/<experiment_id>/<run_id>/meta.json | params.json | metrics.json | artifacts/
//! <root>/<experiment_id>/models/m-<model_id>/meta.json | artifacts/
//! ```

use chrono::{DateTime, Utc};
use heartwise_core::TrackingSettings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{Result, TrackingError};
use crate::run::ActiveRun;

pub const META_FILE: &str = "meta.json";
pub const PARAMS_FILE: &str = "params.json";
pub const METRICS_FILE: &str = "metrics.json";
pub const ARTIFACTS_DIR: &str = "artifacts";
pub const MODELS_DIR: &str = "models";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub name: String,
    pub artifact_location: String,
    pub creation_time: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub run_name: String,
    pub experiment_id: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub artifact_uri: String,
    /// Logged models keyed by artifact path
    #[serde(default)]
    pub models: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggedModelInfo {
    pub model_id: String,
    pub run_id: String,
    pub experiment_id: String,
    pub artifact_path: String,
    pub model_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Root of the experiment directory tree
#[derive(Clone, Debug)]
pub struct TrackingStore {
    root: PathBuf,
}

impl TrackingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_settings(settings: &TrackingSettings) -> Self {
        Self::new(settings.tracking_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn experiment_dir(&self, experiment_id: &str) -> PathBuf {
        self.root.join(experiment_id)
    }

    pub fn models_dir(&self, experiment_id: &str) -> PathBuf {
        self.experiment_dir(experiment_id).join(MODELS_DIR)
    }

    pub fn run_dir(&self, experiment_id: &str, run_id: &str) -> PathBuf {
        self.experiment_dir(experiment_id).join(run_id)
    }

    /// All experiments with a readable meta file, ordered by id
    pub fn list_experiments(&self) -> Result<Vec<Experiment>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut experiments = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| TrackingError::io(&self.root, e))? {
            let path = entry.map_err(|e| TrackingError::io(&self.root, e))?.path();
            let meta = path.join(META_FILE);
            if meta.is_file() {
                experiments.push(read_json::<Experiment>(&meta)?);
            }
        }
        experiments.sort_by_key(|e| (e.experiment_id.len(), e.experiment_id.clone()));
        Ok(experiments)
    }

    pub fn find_experiment(&self, name: &str) -> Result<Option<Experiment>> {
        Ok(self
            .list_experiments()?
            .into_iter()
            .find(|experiment| experiment.name == name))
    }

    /// Look up an experiment by name, creating it with the next numeric id
    pub fn get_or_create_experiment(&self, name: &str) -> Result<Experiment> {
        let existing = self.list_experiments()?;
        if let Some(experiment) = existing.iter().find(|e| e.name == name) {
            return Ok(experiment.clone());
        }

        let next_id = existing
            .iter()
            .filter_map(|e| e.experiment_id.parse::<u64>().ok())
            .max()
            .map_or(1, |id| id + 1)
            .to_string();
        let dir = self.experiment_dir(&next_id);
        create_dir(&dir)?;

        let experiment = Experiment {
            experiment_id: next_id,
            name: name.to_string(),
            artifact_location: file_uri(&dir),
            creation_time: Utc::now(),
        };
        write_json(&dir.join(META_FILE), &experiment)?;
        info!(experiment = name, id = %experiment.experiment_id, "created experiment");
        Ok(experiment)
    }

    pub fn start_run(&self, experiment: &Experiment, run_name: &str) -> Result<ActiveRun> {
        let run_id = Uuid::new_v4().simple().to_string();
        let dir = self.run_dir(&experiment.experiment_id, &run_id);
        create_dir(&dir.join(ARTIFACTS_DIR))?;

        let info = RunInfo {
            run_id,
            run_name: run_name.to_string(),
            experiment_id: experiment.experiment_id.clone(),
            status: RunStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            artifact_uri: file_uri(&dir.join(ARTIFACTS_DIR)),
            models: BTreeMap::new(),
        };
        write_json(&dir.join(META_FILE), &info)?;
        debug!(run_id = %info.run_id, run_name, "run started");

        Ok(ActiveRun::new(self.clone(), info, dir))
    }

    /// Locate a run by id across all experiments
    pub fn get_run(&self, run_id: &str) -> Result<RunInfo> {
        for experiment in self.list_experiments()? {
            let meta = self
                .run_dir(&experiment.experiment_id, run_id)
                .join(META_FILE);
            if meta.is_file() {
                return read_json(&meta);
            }
        }
        Err(TrackingError::RunNotFound(run_id.to_string()))
    }

    pub fn get_params(&self, run: &RunInfo) -> Result<BTreeMap<String, String>> {
        read_json_or_default(&self.run_dir(&run.experiment_id, &run.run_id).join(PARAMS_FILE))
    }

    /// Logged metrics; NaN values are stored as `null` and read back as NaN
    pub fn get_metrics(&self, run: &RunInfo) -> Result<BTreeMap<String, f64>> {
        let stored: BTreeMap<String, Option<f64>> = read_json_or_default(
            &self.run_dir(&run.experiment_id, &run.run_id).join(METRICS_FILE),
        )?;
        Ok(stored
            .into_iter()
            .map(|(key, value)| (key, value.unwrap_or(f64::NAN)))
            .collect())
    }

    pub fn model_dir(&self, experiment_id: &str, model_id: &str) -> PathBuf {
        self.models_dir(experiment_id).join(model_id)
    }

    /// Artifact directory of a model logged by `run` under `artifact_path`
    pub fn run_model_artifacts(&self, run: &RunInfo, artifact_path: &str) -> Result<PathBuf> {
        let model_id = run
            .models
            .get(artifact_path)
            .ok_or_else(|| TrackingError::ModelNotFound {
                run_id: run.run_id.clone(),
                artifact_path: artifact_path.to_string(),
            })?;
        Ok(self
            .model_dir(&run.experiment_id, model_id)
            .join(ARTIFACTS_DIR))
    }

    pub fn get_logged_model(&self, experiment_id: &str, model_id: &str) -> Result<LoggedModelInfo> {
        read_json(&self.model_dir(experiment_id, model_id).join(META_FILE))
    }
}

/// `file://` URI of an absolute form of `path`
pub fn file_uri(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    format!("file://{}", absolute.display())
}

pub(crate) fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| TrackingError::io(path, e))
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| TrackingError::io(path, e))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| TrackingError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if path.is_file() {
        read_json(path)
    } else {
        Ok(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiments_are_created_once_with_increasing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackingStore::new(dir.path());

        let first = store.get_or_create_experiment("heart").unwrap();
        let again = store.get_or_create_experiment("heart").unwrap();
        let other = store.get_or_create_experiment("other").unwrap();

        assert_eq!(first, again);
        assert_eq!(first.experiment_id, "1");
        assert_eq!(other.experiment_id, "2");
        assert_eq!(store.list_experiments().unwrap().len(), 2);
        assert!(store.find_experiment("missing").unwrap().is_none());
    }

    #[test]
    fn missing_root_has_no_experiments() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackingStore::new(dir.path().join("absent"));
        assert!(store.list_experiments().unwrap().is_empty());
    }

    #[test]
    fn runs_are_found_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackingStore::new(dir.path());
        let experiment = store.get_or_create_experiment("heart").unwrap();

        let run = store.start_run(&experiment, "probe").unwrap();
        let run_id = run.info().run_id.clone();
        assert_eq!(run_id.len(), 32);

        let found = store.get_run(&run_id).unwrap();
        assert_eq!(found.run_name, "probe");
        assert_eq!(found.status, RunStatus::Running);
        assert!(matches!(
            store.get_run("nope"),
            Err(TrackingError::RunNotFound(_))
        ));
    }

    #[test]
    fn file_uri_is_absolute() {
        assert_eq!(file_uri(Path::new("/tmp/x")), "file:///tmp/x");
        assert!(file_uri(Path::new("rel")).starts_with("file:///"));
    }
}
