//! Environment-driven configuration
//!
//! Values resolve in three layers: built-in defaults, an optional TOML file
//! named by `HEARTWISE_CONFIG`, then individual environment variables. Every
//! entry point (CLI, service, tests) goes through [`Settings::from_lookup`],
//! so tests can inject values without touching the process environment.

use crate::errors::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_FILE_ENV: &str = "HEARTWISE_CONFIG";

/// Public UCI archive holding the processed Cleveland heart-disease data
pub const DEFAULT_DATA_URL: &str =
    "https://archive.ics.uci.edu/static/public/45/heart+disease.zip";

/// Complete configuration snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub tracking: TrackingSettings,
    pub model: ModelSettings,
    pub api: ApiSettings,
    pub logging: LoggingSettings,
}

/// Dataset location and acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub url: String,
    pub dir: PathBuf,
    pub csv_filename: String,
    pub target_data_file: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATA_URL.to_string(),
            dir: PathBuf::from("data"),
            csv_filename: "heart.csv".to_string(),
            target_data_file: "processed.cleveland.data".to_string(),
        }
    }
}

impl DataSettings {
    /// Full path to the raw CSV produced by acquisition
    pub fn csv_path(&self) -> PathBuf {
        self.dir.join(&self.csv_filename)
    }
}

/// Experiment tracking store and model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    pub experiment_name: String,
    pub mlruns_dir: PathBuf,
    /// Explicit tracking URI; derived from `mlruns_dir` when unset
    pub tracking_uri: Option<String>,
    /// Explicit model locator that bypasses resolution
    pub model_uri: Option<String>,
    /// Train once at service startup when no model can be resolved
    pub auto_train: bool,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            experiment_name: "heart-disease-experiment".to_string(),
            mlruns_dir: PathBuf::from("mlruns"),
            tracking_uri: None,
            model_uri: None,
            auto_train: true,
        }
    }
}

impl TrackingSettings {
    /// Tracking URI, defaulting to a `file://` URI under the working directory
    pub fn tracking_uri(&self) -> String {
        if let Some(uri) = &self.tracking_uri {
            return uri.clone();
        }
        let root = if self.mlruns_dir.is_absolute() {
            self.mlruns_dir.clone()
        } else {
            env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(&self.mlruns_dir)
        };
        format!("file://{}", root.display())
    }

    /// Filesystem root of the tracking store
    pub fn tracking_root(&self) -> PathBuf {
        match &self.tracking_uri {
            Some(uri) => uri_to_path(uri),
            None => self.mlruns_dir.clone(),
        }
    }
}

/// Strip a `file:` scheme from a URI, leaving plain paths untouched
pub fn uri_to_path(uri: &str) -> PathBuf {
    if let Some(rest) = uri.strip_prefix("file://") {
        PathBuf::from(rest)
    } else if let Some(rest) = uri.strip_prefix("file:") {
        PathBuf::from(rest)
    } else {
        PathBuf::from(uri)
    }
}

/// Training and hyperparameter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub random_state: u64,
    pub test_size: f64,
    pub cv_folds: usize,
    pub production_model_dir: PathBuf,
    pub logreg_max_iter: usize,
    pub rf_n_estimators: usize,
    pub rf_max_depth: Option<usize>,
    pub rf_min_samples_split: usize,
    pub grid: GridSettings,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            random_state: 42,
            test_size: 0.2,
            cv_folds: 5,
            production_model_dir: PathBuf::from("models/production_model"),
            logreg_max_iter: 1000,
            rf_n_estimators: 200,
            rf_max_depth: None,
            rf_min_samples_split: 5,
            grid: GridSettings::default(),
        }
    }
}

/// Random forest search grid. A depth of 0 stands for unlimited depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<usize>,
    pub min_samples_split: Vec<usize>,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200],
            max_depth: vec![0, 6, 10],
            min_samples_split: vec![2, 5],
        }
    }
}

impl GridSettings {
    pub fn depth_candidates(&self) -> Vec<Option<usize>> {
        self.max_depth
            .iter()
            .map(|&depth| if depth == 0 { None } else { Some(depth) })
            .collect()
    }
}

/// HTTP front end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub title: String,
    pub description: String,
    pub version: String,
    pub host: String,
    pub port: u16,
    pub cors_allow_origins: Vec<String>,
    pub cors_allow_credentials: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            title: "Heart Disease Prediction API".to_string(),
            description: "HTTP service for predicting heart disease from a tracked model"
                .to_string(),
            version: "1.0".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allow_origins: vec!["*".to_string()],
            cors_allow_credentials: true,
        }
    }
}

impl ApiSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    /// Unknown names fall back to compact output
    pub fn from_name(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Settings {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match non_empty(lookup(CONFIG_FILE_ENV)) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_overrides(&lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a TOML file; missing sections keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("failed to parse config file: {e}")))
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        if let Some(value) = get("DATA_URL") {
            self.data.url = value;
        }
        if let Some(value) = get("DATA_DIR") {
            self.data.dir = PathBuf::from(value);
        }
        if let Some(value) = get("CSV_FILENAME") {
            self.data.csv_filename = value;
        }
        if let Some(value) = get("TARGET_DATA_FILE") {
            self.data.target_data_file = value;
        }

        if let Some(value) = get("MLFLOW_EXPERIMENT_NAME") {
            self.tracking.experiment_name = value;
        }
        if let Some(value) = get("MLRUNS_DIR") {
            self.tracking.mlruns_dir = PathBuf::from(value);
        }
        if let Some(value) = get("MLFLOW_TRACKING_URI") {
            self.tracking.tracking_uri = Some(value);
        }
        if let Some(value) = get("MLFLOW_MODEL_URI") {
            self.tracking.model_uri = Some(value);
        }
        if let Some(value) = get("AUTO_TRAIN") {
            self.tracking.auto_train = parse_bool("AUTO_TRAIN", &value)?;
        }

        if let Some(value) = get("RANDOM_STATE") {
            self.model.random_state = parse_value("RANDOM_STATE", &value)?;
        }
        if let Some(value) = get("TEST_SIZE") {
            self.model.test_size = parse_value("TEST_SIZE", &value)?;
        }
        if let Some(value) = get("CV_FOLDS") {
            self.model.cv_folds = parse_value("CV_FOLDS", &value)?;
        }
        if let Some(value) = get("PRODUCTION_MODEL_DIR") {
            self.model.production_model_dir = PathBuf::from(value);
        }
        if let Some(value) = get("LOGREG_MAX_ITER") {
            self.model.logreg_max_iter = parse_value("LOGREG_MAX_ITER", &value)?;
        }
        if let Some(value) = get("RF_N_ESTIMATORS") {
            self.model.rf_n_estimators = parse_value("RF_N_ESTIMATORS", &value)?;
        }
        if let Some(value) = get("RF_MAX_DEPTH") {
            // 0 means unlimited, as in the grid
            let depth: usize = parse_value("RF_MAX_DEPTH", &value)?;
            self.model.rf_max_depth = (depth > 0).then_some(depth);
        }
        if let Some(value) = get("RF_MIN_SAMPLES_SPLIT") {
            self.model.rf_min_samples_split = parse_value("RF_MIN_SAMPLES_SPLIT", &value)?;
        }

        if let Some(value) = get("API_TITLE") {
            self.api.title = value;
        }
        if let Some(value) = get("API_DESCRIPTION") {
            self.api.description = value;
        }
        if let Some(value) = get("API_VERSION") {
            self.api.version = value;
        }
        if let Some(value) = get("API_HOST") {
            self.api.host = value;
        }
        if let Some(value) = get("API_PORT") {
            self.api.port = parse_value("API_PORT", &value)?;
        }
        if let Some(value) = get("CORS_ALLOW_ORIGINS") {
            self.api.cors_allow_origins = value
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
        }
        if let Some(value) = get("CORS_ALLOW_CREDENTIALS") {
            self.api.cors_allow_credentials = parse_bool("CORS_ALLOW_CREDENTIALS", &value)?;
        }

        if let Some(value) = get("LOG_LEVEL") {
            self.logging.level = value.to_lowercase();
        }
        if let Some(value) = get("LOG_FORMAT") {
            self.logging.format = LogFormat::from_name(&value);
        }

        Ok(())
    }

    /// Reject values that would make training or serving meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.model.test_size > 0.0 && self.model.test_size < 1.0) {
            return Err(CoreError::Config(format!(
                "TEST_SIZE must lie strictly between 0 and 1, got {}",
                self.model.test_size
            )));
        }
        if self.model.cv_folds < 2 {
            return Err(CoreError::Config("CV_FOLDS must be at least 2".to_string()));
        }
        if self.model.rf_n_estimators == 0 {
            return Err(CoreError::Config(
                "RF_N_ESTIMATORS must be greater than zero".to_string(),
            ));
        }
        if self.model.rf_max_depth == Some(0) {
            return Err(CoreError::Config(
                "rf_max_depth must be at least 1; omit it for unlimited depth".to_string(),
            ));
        }
        if self.model.rf_min_samples_split < 2 {
            return Err(CoreError::Config(
                "RF_MIN_SAMPLES_SPLIT must be at least 2".to_string(),
            ));
        }
        if self.tracking.experiment_name.trim().is_empty() {
            return Err(CoreError::Config(
                "MLFLOW_EXPERIMENT_NAME must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse::<T>()
        .map_err(|e| CoreError::Config(format!("invalid value for {key} ({value}): {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    if value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("y")
        || value == "1"
    {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no")
        || value.eq_ignore_ascii_case("n")
        || value == "0"
    {
        Ok(false)
    } else {
        Err(CoreError::Config(format!(
            "invalid boolean for {key}: {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.data.csv_path(), PathBuf::from("data/heart.csv"));
        assert_eq!(settings.model.random_state, 42);
        assert_eq!(settings.model.cv_folds, 5);
        assert_eq!(settings.model.rf_max_depth, None);
        assert_eq!(settings.api.port, 8000);
        assert_eq!(settings.api.cors_allow_origins, vec!["*".to_string()]);
        assert!(settings.api.cors_allow_credentials);
        assert_eq!(settings.logging.format, LogFormat::Compact);
        assert_eq!(
            settings.model.grid.depth_candidates(),
            vec![None, Some(6), Some(10)]
        );
    }

    #[test]
    fn environment_overrides_apply() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DATA_DIR", "/tmp/heart"),
            ("RF_MAX_DEPTH", "6"),
            ("TEST_SIZE", "0.25"),
            ("CORS_ALLOW_ORIGINS", "http://a.test, http://b.test"),
            ("CORS_ALLOW_CREDENTIALS", "false"),
            ("LOG_FORMAT", "JSON"),
            ("MLFLOW_MODEL_URI", "file:///models/m-1/artifacts"),
        ]))
        .unwrap();

        assert_eq!(settings.data.csv_path(), PathBuf::from("/tmp/heart/heart.csv"));
        assert_eq!(settings.model.rf_max_depth, Some(6));
        assert_eq!(settings.model.test_size, 0.25);
        assert_eq!(
            settings.api.cors_allow_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(!settings.api.cors_allow_credentials);
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(
            settings.tracking.model_uri.as_deref(),
            Some("file:///models/m-1/artifacts")
        );
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Settings::from_lookup(lookup_from(&[("CV_FOLDS", "five")])).unwrap_err();
        assert!(err.to_string().contains("CV_FOLDS"));
    }

    #[test]
    fn out_of_range_test_size_is_rejected() {
        assert!(Settings::from_lookup(lookup_from(&[("TEST_SIZE", "1.5")])).is_err());
    }

    #[test]
    fn zero_forest_depth_means_unlimited() {
        let settings = Settings::from_lookup(lookup_from(&[("RF_MAX_DEPTH", "0")])).unwrap();
        assert_eq!(settings.model.rf_max_depth, None);

        let mut settings = Settings::default();
        settings.model.rf_max_depth = Some(0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn file_layer_sits_under_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\nrandom_state = 7\ncv_folds = 3\n\n[api]\nport = 9100").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let settings = Settings::from_lookup(lookup_from(&[
            (CONFIG_FILE_ENV, path.as_str()),
            ("API_PORT", "9200"),
        ]))
        .unwrap();

        assert_eq!(settings.model.random_state, 7);
        assert_eq!(settings.model.cv_folds, 3);
        assert_eq!(settings.api.port, 9200);
        assert_eq!(settings.model.test_size, 0.2);
    }

    #[test]
    fn tracking_root_strips_file_scheme() {
        let tracking = TrackingSettings {
            tracking_uri: Some("file:///srv/mlruns".to_string()),
            ..TrackingSettings::default()
        };
        assert_eq!(tracking.tracking_root(), PathBuf::from("/srv/mlruns"));
        assert_eq!(tracking.tracking_uri(), "file:///srv/mlruns");

        let relative = TrackingSettings::default();
        assert_eq!(relative.tracking_root(), PathBuf::from("mlruns"));
        assert!(relative.tracking_uri().starts_with("file://"));
    }
}
