//! Model comparison table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

use crate::errors::{Result, TrainerError};
use crate::metrics::ModelMetrics;

/// Metric columns, in display order
pub const METRIC_COLUMNS: [&str; 5] = ["accuracy", "precision", "recall", "roc_auc", "cv_accuracy"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub model: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub roc_auc: f64,
    pub cv_accuracy: f64,
}

impl ComparisonRow {
    pub fn new(model: impl Into<String>, metrics: &ModelMetrics, cv_accuracy: f64) -> Self {
        Self {
            model: model.into(),
            accuracy: metrics.accuracy,
            precision: metrics.precision,
            recall: metrics.recall,
            roc_auc: metrics.roc_auc,
            cv_accuracy,
        }
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        match column {
            "accuracy" => Some(self.accuracy),
            "precision" => Some(self.precision),
            "recall" => Some(self.recall),
            "roc_auc" => Some(self.roc_auc),
            "cv_accuracy" => Some(self.cv_accuracy),
            _ => None,
        }
    }

    fn values(&self) -> [f64; 5] {
        [
            self.accuracy,
            self.precision,
            self.recall,
            self.roc_auc,
            self.cv_accuracy,
        ]
    }
}

/// One row per evaluated model
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn push(&mut self, row: ComparisonRow) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &METRIC_COLUMNS
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.model.as_str())
    }

    pub fn row(&self, model: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.model == model)
    }

    pub fn get(&self, model: &str, column: &str) -> Option<f64> {
        self.row(model)?.value(column)
    }

    /// Row with the highest value in `column`; the earlier row wins ties
    pub fn best_by(&self, column: &str) -> Option<&ComparisonRow> {
        let mut best: Option<(&ComparisonRow, f64)> = None;
        for row in &self.rows {
            let Some(value) = row.value(column) else {
                continue;
            };
            if best.map_or(true, |(_, current)| value > current) {
                best = Some((row, value));
            }
        }
        best.map(|(row, _)| row)
    }

    /// CSV with a `model` column followed by the metric columns
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        let header = std::iter::once("model").chain(METRIC_COLUMNS);
        writer.write_record(header)?;
        for row in &self.rows {
            let values = row.values();
            let record =
                std::iter::once(row.model.clone()).chain(values.iter().map(|v| v.to_string()));
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TrainerError::Training(e.to_string()))
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.model.len())
            .max()
            .unwrap_or(0)
            .max("model".len());

        write!(f, "{:<name_width$}", "model")?;
        for column in METRIC_COLUMNS {
            write!(f, "  {column:>11}")?;
        }
        for row in &self.rows {
            writeln!(f)?;
            write!(f, "{:<name_width$}", row.model)?;
            for value in row.values() {
                write!(f, "  {value:>11.4}")?;
            }
        }
        Ok(())
    }
}
