//! Classifier model representation
//!
//! Fitted models live here so that both the trainer (which builds them) and
//! the inference service (which only scores them) share one definition.
//! Fitting of the forest and logistic regression happens in the trainer crate.

mod logistic;
mod pipeline;
mod scaler;
mod tree;

pub use logistic::LogisticRegression;
pub use pipeline::{Estimator, FittedPipeline};
pub use scaler::StandardScaler;
pub use tree::{Node, RandomForest, Tree};

/// Binary classifier operating on row-major feature tables
pub trait Classifier: Send + Sync {
    /// Number of features each row must carry
    fn feature_count(&self) -> usize;

    /// Predicted class (0 or 1) for every row
    fn predict(&self, rows: &[Vec<f64>]) -> Vec<u8>;

    /// Positive-class probability for every row, when the model provides one
    fn predict_proba(&self, _rows: &[Vec<f64>]) -> Option<Vec<f64>> {
        None
    }

    /// Short human readable model name
    fn name(&self) -> &str {
        "classifier"
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(!sigmoid(-800.0).is_nan());
    }
}
