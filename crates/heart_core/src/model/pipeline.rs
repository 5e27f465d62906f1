use super::{Classifier, LogisticRegression, RandomForest, StandardScaler};
use crate::errors::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Final estimator of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl Estimator {
    fn as_classifier(&self) -> &dyn Classifier {
        match self {
            Estimator::LogisticRegression(model) => model,
            Estimator::RandomForest(model) => model,
        }
    }

    pub fn name(&self) -> &str {
        self.as_classifier().name()
    }
}

/// Optional scaling step followed by an estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    pub estimator: Estimator,
}

impl FittedPipeline {
    pub fn new(scaler: Option<StandardScaler>, estimator: Estimator) -> Self {
        Self { scaler, estimator }
    }

    /// Structural checks run after deserializing an artifact
    pub fn validate(&self) -> Result<()> {
        let width = self.estimator.as_classifier().feature_count();
        if let Some(scaler) = &self.scaler {
            if scaler.scale.len() != scaler.mean.len() || scaler.feature_count() != width {
                return Err(CoreError::InvalidModel(format!(
                    "scaler width {} does not match estimator width {width}",
                    scaler.feature_count()
                )));
            }
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                return Err(CoreError::InvalidModel("scaler has a zero scale".to_string()));
            }
        }
        if let Estimator::RandomForest(forest) = &self.estimator {
            forest.validate().map_err(CoreError::InvalidModel)?;
        }
        Ok(())
    }

    fn prepare(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        match &self.scaler {
            Some(scaler) => scaler.transform(rows),
            None => rows.to_vec(),
        }
    }
}

impl Classifier for FittedPipeline {
    fn feature_count(&self) -> usize {
        self.estimator.as_classifier().feature_count()
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Vec<u8> {
        self.estimator.as_classifier().predict(&self.prepare(rows))
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Option<Vec<f64>> {
        self.estimator.as_classifier().predict_proba(&self.prepare(rows))
    }

    fn name(&self) -> &str {
        self.estimator.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_before_estimating() {
        let pipeline = FittedPipeline::new(
            Some(StandardScaler {
                mean: vec![10.0],
                scale: vec![2.0],
            }),
            Estimator::LogisticRegression(LogisticRegression {
                coefficients: vec![1.0],
                intercept: 0.0,
            }),
        );

        assert_eq!(pipeline.predict(&[vec![12.0], vec![8.0]]), vec![1, 0]);
        assert_eq!(pipeline.name(), "logistic_regression");
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn estimator_is_tagged_by_kind() {
        let estimator = Estimator::LogisticRegression(LogisticRegression {
            coefficients: vec![0.5],
            intercept: 1.0,
        });
        let json = serde_json::to_value(&estimator).unwrap();
        assert_eq!(json["kind"], "logistic_regression");
    }

    #[test]
    fn width_mismatch_is_invalid() {
        let pipeline = FittedPipeline::new(
            Some(StandardScaler {
                mean: vec![0.0, 0.0],
                scale: vec![1.0, 1.0],
            }),
            Estimator::LogisticRegression(LogisticRegression {
                coefficients: vec![1.0],
                intercept: 0.0,
            }),
        );
        assert!(pipeline.validate().is_err());
    }
}
