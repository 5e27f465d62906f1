//! Binary classification metrics

use heartwise_core::Classifier;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Test-split evaluation of one model
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub roc_auc: f64,
}

impl ModelMetrics {
    /// Metric names and values in reporting order
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("roc_auc", self.roc_auc),
        ]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

/// One point on a ROC curve; rows scoring at least `threshold` are positive
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

/// Score a model on a dataset. Probabilities feed ROC-AUC; models without
/// them are ranked by their hard predictions.
pub fn evaluate(model: &dyn Classifier, data: &Dataset) -> ModelMetrics {
    let predictions = model.predict(&data.features);
    let scores = scores(model, data, &predictions);

    ModelMetrics {
        accuracy: accuracy(&data.targets, &predictions),
        precision: precision(&data.targets, &predictions),
        recall: recall(&data.targets, &predictions),
        roc_auc: roc_auc(&data.targets, &scores),
    }
}

/// Positive-class scores used for ranking metrics
pub fn scores(model: &dyn Classifier, data: &Dataset, predictions: &[u8]) -> Vec<f64> {
    model
        .predict_proba(&data.features)
        .unwrap_or_else(|| predictions.iter().map(|&p| f64::from(p)).collect())
}

pub fn confusion_matrix(y_true: &[u8], y_pred: &[u8]) -> ConfusionMatrix {
    let mut matrix = ConfusionMatrix::default();
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t == 1, p == 1) {
            (false, false) => matrix.true_negatives += 1,
            (false, true) => matrix.false_positives += 1,
            (true, false) => matrix.false_negatives += 1,
            (true, true) => matrix.true_positives += 1,
        }
    }
    matrix
}

pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// `tp / (tp + fp)`, 0 when nothing was predicted positive
pub fn precision(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let m = confusion_matrix(y_true, y_pred);
    ratio(m.true_positives, m.true_positives + m.false_positives)
}

/// `tp / (tp + fn)`, 0 when there are no positives
pub fn recall(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let m = confusion_matrix(y_true, y_pred);
    ratio(m.true_positives, m.true_positives + m.false_negatives)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Area under the ROC curve via the rank-sum statistic, ties averaged.
/// NaN when only one class is present.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> f64 {
    let positives = y_true.iter().filter(|&&t| t == 1).count();
    let negatives = y_true.len() - positives;
    if positives == 0 || negatives == 0 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j+1 share their mean
        let average = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = average;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|&(&t, _)| t == 1)
        .map(|(_, &r)| r)
        .sum();
    let p = positives as f64;
    (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64)
}

/// ROC curve over distinct score thresholds, highest first, starting at (0, 0)
pub fn roc_curve(y_true: &[u8], scores: &[f64]) -> Vec<RocPoint> {
    let positives = y_true.iter().filter(|&&t| t == 1).count() as f64;
    let negatives = y_true.len() as f64 - positives;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];
    let (mut tp, mut fp) = (0.0, 0.0);
    for (k, &idx) in order.iter().enumerate() {
        if y_true[idx] == 1 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_tie = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if last_of_tie {
            points.push(RocPoint {
                threshold: scores[idx],
                fpr: if negatives > 0.0 { fp / negatives } else { 0.0 },
                tpr: if positives > 0.0 { tp / positives } else { 0.0 },
            });
        }
    }
    points
}
