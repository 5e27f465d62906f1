//! Model artifact persistence
//!
//! An artifact directory holds `model.json` (canonical JSON of a
//! [`ModelArtifact`]) and `model.hash` (BLAKE3 hex of those exact bytes).

use crate::errors::{CoreError, Result};
use crate::model::FittedPipeline;
use crate::serialization::{canonical_json_string, content_hash};
use crate::types::FEATURE_COLUMNS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MODEL_FILE: &str = "model.json";
pub const HASH_FILE: &str = "model.hash";

const FLAVOR: &str = "heartwise.pipeline";
const FORMAT_VERSION: u32 = 1;

/// Serialized form of a fitted pipeline plus descriptive metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub flavor: String,
    pub format_version: u32,
    pub estimator: String,
    pub feature_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub pipeline: FittedPipeline,
}

/// Location and hash of a persisted artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedModel {
    pub model_path: PathBuf,
    pub hash: String,
}

impl ModelArtifact {
    pub fn new(pipeline: FittedPipeline) -> Self {
        Self {
            flavor: FLAVOR.to_string(),
            format_version: FORMAT_VERSION,
            estimator: pipeline.estimator.name().to_string(),
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            created_at: Utc::now(),
            pipeline,
        }
    }

    /// Write `model.json` and `model.hash` into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<SavedModel> {
        fs::create_dir_all(dir)?;
        let json = canonical_json_string(self)?;
        let hash = content_hash(&json);

        let model_path = dir.join(MODEL_FILE);
        fs::write(&model_path, &json)?;
        fs::write(dir.join(HASH_FILE), &hash)?;
        debug!(path = %model_path.display(), %hash, "model artifact written");

        Ok(SavedModel { model_path, hash })
    }

    /// Load an artifact from a directory or a direct `model.json` path
    ///
    /// When a sibling `model.hash` exists the content must match it.
    pub fn load(path: &Path) -> Result<Self> {
        let model_path = if path.is_dir() {
            path.join(MODEL_FILE)
        } else {
            path.to_path_buf()
        };
        let json = fs::read_to_string(&model_path)?;

        let hash_path = model_path.with_file_name(HASH_FILE);
        match fs::read_to_string(&hash_path) {
            Ok(expected) => {
                let expected = expected.trim().to_string();
                let actual = content_hash(&json);
                if expected != actual {
                    return Err(CoreError::IntegrityMismatch { expected, actual });
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %model_path.display(), "model artifact has no hash file, skipping integrity check");
            }
            Err(err) => return Err(err.into()),
        }

        let artifact: ModelArtifact = serde_json::from_str(&json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        if self.flavor != FLAVOR {
            return Err(CoreError::InvalidModel(format!(
                "unsupported model flavor {:?}",
                self.flavor
            )));
        }
        if self.format_version != FORMAT_VERSION {
            return Err(CoreError::InvalidModel(format!(
                "unsupported format version {}",
                self.format_version
            )));
        }
        self.pipeline.validate()
    }
}
