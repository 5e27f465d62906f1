//! L2-regularised logistic regression fitted by full-batch gradient descent

use heartwise_core::LogisticRegression;
use tracing::debug;

use crate::errors::{Result, TrainerError};

#[derive(Clone, Debug, PartialEq)]
pub struct LogisticConfig {
    pub max_iter: usize,
    /// Inverse regularisation strength
    pub c: f64,
    /// Stop once every gradient component is below this
    pub tol: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            c: 1.0,
            tol: 1e-6,
        }
    }
}

/// Minimise `mean(log_loss) + ||w||^2 / (2 C n)`; the intercept is not penalised.
pub fn fit_logistic(
    features: &[Vec<f64>],
    targets: &[u8],
    config: &LogisticConfig,
) -> Result<LogisticRegression> {
    let n = features.len();
    if n == 0 || n != targets.len() {
        return Err(TrainerError::Training(format!(
            "logistic regression needs matching non-empty inputs, got {n} rows and {} targets",
            targets.len()
        )));
    }
    if config.c <= 0.0 {
        return Err(TrainerError::Training("C must be positive".to_string()));
    }

    let width = features[0].len();
    let nf = n as f64;
    let penalty = 1.0 / (config.c * nf);

    // step of 1/L, with L bounding the Hessian's largest eigenvalue
    let mean_sq_norm = features
        .iter()
        .map(|row| row.iter().map(|x| x * x).sum::<f64>() + 1.0)
        .sum::<f64>()
        / nf;
    let step = 1.0 / (0.25 * mean_sq_norm + penalty);

    let mut model = LogisticRegression {
        coefficients: vec![0.0; width],
        intercept: 0.0,
    };
    let mut grad_w = vec![0.0; width];
    let mut iterations = 0;

    for _ in 0..config.max_iter {
        iterations += 1;
        grad_w.iter_mut().for_each(|g| *g = 0.0);
        let mut grad_b = 0.0;

        for (row, &target) in features.iter().zip(targets) {
            let error = model.probability_row(row) - f64::from(target);
            for (g, x) in grad_w.iter_mut().zip(row) {
                *g += error * x;
            }
            grad_b += error;
        }

        let mut largest = (grad_b / nf).abs();
        for (g, w) in grad_w.iter_mut().zip(&model.coefficients) {
            *g = *g / nf + penalty * w;
            largest = largest.max(g.abs());
        }
        if largest < config.tol {
            break;
        }

        for (w, g) in model.coefficients.iter_mut().zip(&grad_w) {
            *w -= step * g;
        }
        model.intercept -= step * grad_b / nf;
    }

    debug!(iterations, "logistic regression fitted");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartwise_core::Classifier;

    #[test]
    fn separates_a_linear_boundary() {
        let features: Vec<Vec<f64>> = (0..20).map(|i| vec![(i as f64 - 9.5) / 5.0]).collect();
        let targets: Vec<u8> = (0..20).map(|i| u8::from(i >= 10)).collect();

        let model = fit_logistic(&features, &targets, &LogisticConfig::default()).unwrap();

        assert!(model.coefficients[0] > 0.0);
        assert_eq!(model.predict(&features), targets);
    }

    #[test]
    fn regularisation_shrinks_weights() {
        let features: Vec<Vec<f64>> = (0..20).map(|i| vec![(i as f64 - 9.5) / 5.0]).collect();
        let targets: Vec<u8> = (0..20).map(|i| u8::from(i >= 10)).collect();

        let loose = fit_logistic(&features, &targets, &LogisticConfig::default()).unwrap();
        let strong = fit_logistic(
            &features,
            &targets,
            &LogisticConfig {
                c: 0.01,
                ..LogisticConfig::default()
            },
        )
        .unwrap();

        assert!(strong.coefficients[0].abs() < loose.coefficients[0].abs());
    }

    #[test]
    fn rejects_mismatched_inputs() {
        assert!(fit_logistic(&[], &[], &LogisticConfig::default()).is_err());
        assert!(fit_logistic(&[vec![1.0]], &[0, 1], &LogisticConfig::default()).is_err());
    }
}
