//! Patient record schema and prediction result types

use crate::errors::{CoreError, Result};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Number of model input features
pub const FEATURE_COUNT: usize = 13;

/// Feature columns in model input order
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// Label column appended after the features
pub const TARGET_COLUMN: &str = "target";

/// Canonical column names of a cleaned table
pub const COLUMN_NAMES: [&str; FEATURE_COUNT + 1] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal", "target",
];

/// Columns that are label-encoded during cleaning
pub const CATEGORICAL_COLUMNS: [&str; 8] =
    ["cp", "restecg", "slope", "thal", "sex", "fbs", "exang", "ca"];

/// A single patient's clinical measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(deserialize_with = "lenient_f64")]
    pub age: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub sex: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub cp: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub trestbps: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub chol: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub fbs: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub restecg: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub thalach: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub exang: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub oldpeak: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub slope: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub ca: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub thal: f64,
}

impl PatientRecord {
    /// Feature vector in [`FEATURE_COLUMNS`] order
    pub fn to_features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.sex,
            self.cp,
            self.trestbps,
            self.chol,
            self.fbs,
            self.restecg,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.thal,
        ]
    }

    /// Build a record from a feature slice in [`FEATURE_COLUMNS`] order
    pub fn from_features(features: &[f64]) -> Result<Self> {
        if features.len() != FEATURE_COUNT {
            return Err(CoreError::InvalidModel(format!(
                "expected {FEATURE_COUNT} features, got {}",
                features.len()
            )));
        }
        Ok(Self {
            age: features[0],
            sex: features[1],
            cp: features[2],
            trestbps: features[3],
            chol: features[4],
            fbs: features[5],
            restecg: features[6],
            thalach: features[7],
            exang: features[8],
            oldpeak: features[9],
            slope: features[10],
            ca: features[11],
            thal: features[12],
        })
    }
}

/// Outcome of a single-row prediction
///
/// `confidence` is the positive-class probability, or NaN when the model has
/// no probability output. NaN serializes as JSON `null`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: u8,
    #[serde(deserialize_with = "nullable_f64")]
    pub confidence: f64,
}

impl PredictionResult {
    pub fn has_confidence(&self) -> bool {
        !self.confidence.is_nan()
    }
}

/// Accept JSON numbers and numeric strings
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::String(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got {raw:?}"))),
    }
}

fn nullable_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
