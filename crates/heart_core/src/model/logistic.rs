use super::{sigmoid, Classifier};
use serde::{Deserialize, Serialize};

/// Fitted binary logistic regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    pub fn decision_function_row(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    pub fn probability_row(&self, features: &[f64]) -> f64 {
        sigmoid(self.decision_function_row(features))
    }
}

impl Classifier for LogisticRegression {
    fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Vec<u8> {
        rows.iter()
            .map(|row| u8::from(self.decision_function_row(row) > 0.0))
            .collect()
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Option<Vec<f64>> {
        Some(rows.iter().map(|row| self.probability_row(row)).collect())
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}
