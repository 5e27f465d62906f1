//! Model Resolver
//!
//! Finds the most recently written logged model of an experiment. Filesystem
//! failures are logged and reported as "nothing found".

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, info};

use crate::store::{file_uri, TrackingStore, ARTIFACTS_DIR};

/// Most recently modified subdirectory of `dir`
///
/// Equal modification times are broken by the greater directory name.
/// Returns `None` when `dir` is missing, empty or unreadable.
pub fn latest_subdirectory(dir: &Path) -> Option<PathBuf> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "model directory does not exist");
        return None;
    }
    match scan_latest(dir) {
        Ok(latest) => latest,
        Err(err) => {
            error!(dir = %dir.display(), %err, "failed to scan model directory");
            None
        }
    }
}

fn scan_latest(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_dir() {
            continue;
        }
        let modified = metadata.modified()?;
        let path = entry.path();
        let newer = match &latest {
            None => true,
            Some((time, current)) => {
                modified > *time || (modified == *time && path.file_name() > current.file_name())
            }
        };
        if newer {
            latest = Some((modified, path));
        }
    }
    Ok(latest.map(|(_, path)| path))
}

/// `file://` URI of the newest logged model's artifact directory
pub fn latest_model_uri(store: &TrackingStore, experiment_name: &str) -> Option<String> {
    let experiment = match store.find_experiment(experiment_name) {
        Ok(Some(experiment)) => experiment,
        Ok(None) => {
            info!(experiment = experiment_name, "experiment has not been created yet");
            return None;
        }
        Err(err) => {
            error!(experiment = experiment_name, %err, "failed to read tracking store");
            return None;
        }
    };

    let latest = latest_subdirectory(&store.models_dir(&experiment.experiment_id))?;
    let uri = file_uri(&latest.join(ARTIFACTS_DIR));
    info!(%uri, "resolved latest model");
    Some(uri)
}
