//! Model locators
//!
//! Accepted forms: `file:///abs/dir`, a plain filesystem path, and
//! `runs:/<run_id>/<artifact_path>` resolved through the tracking store.

use heartwise_core::config::uri_to_path;
use std::fmt;
use std::path::PathBuf;

use crate::errors::{Result, TrackingError};
use crate::store::TrackingStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelLocator {
    Path(PathBuf),
    Run {
        run_id: String,
        artifact_path: String,
    },
}

impl ModelLocator {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TrackingError::InvalidLocator(raw.to_string()));
        }

        if let Some(rest) = raw.strip_prefix("runs:/") {
            let rest = rest.trim_start_matches('/');
            let (run_id, artifact_path) = rest
                .split_once('/')
                .filter(|(run, path)| !run.is_empty() && !path.is_empty())
                .ok_or_else(|| TrackingError::InvalidLocator(raw.to_string()))?;
            return Ok(ModelLocator::Run {
                run_id: run_id.to_string(),
                artifact_path: artifact_path.trim_end_matches('/').to_string(),
            });
        }

        match raw.split_once("://") {
            Some(("file", _)) => Ok(ModelLocator::Path(uri_to_path(raw))),
            Some((scheme, _)) => Err(TrackingError::InvalidLocator(format!(
                "unsupported scheme {scheme:?} in {raw}"
            ))),
            None => Ok(ModelLocator::Path(uri_to_path(raw))),
        }
    }

    /// Filesystem location of the model artifact directory
    pub fn resolve(&self, store: &TrackingStore) -> Result<PathBuf> {
        match self {
            ModelLocator::Path(path) => Ok(path.clone()),
            ModelLocator::Run {
                run_id,
                artifact_path,
            } => {
                let run = store.get_run(run_id)?;
                store.run_model_artifacts(&run, artifact_path)
            }
        }
    }
}

impl fmt::Display for ModelLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelLocator::Path(path) => write!(f, "{}", path.display()),
            ModelLocator::Run {
                run_id,
                artifact_path,
            } => write!(f, "runs:/{run_id}/{artifact_path}"),
        }
    }
}
