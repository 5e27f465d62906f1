//! Dataset Cleaner
//!
//! Turns a raw headerless table into the canonical 14-column numeric table:
//! rows with missing values are dropped, categorical columns are label
//! encoded (fit fresh on every call) and the target is binarized.

use crate::errors::{DataError, Result};
use crate::table::RawTable;
use heartwise_core::{CATEGORICAL_COLUMNS, COLUMN_NAMES, FEATURE_COUNT};
use std::cmp::Ordering;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

const WIDTH: usize = FEATURE_COUNT + 1;
const TARGET_INDEX: usize = FEATURE_COUNT;

/// Maps the distinct values of a column to `0..n`
///
/// Values are ordered numerically when every one of them parses as a finite
/// number, lexicographically otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelEncoder {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl LabelEncoder {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let values: Vec<&str> = values.into_iter().collect();
        let numbers: Option<Vec<f64>> = values
            .iter()
            .map(|v| v.parse::<f64>().ok().filter(|n| n.is_finite()))
            .collect();

        match numbers {
            Some(mut numbers) => {
                numbers.sort_by(|a, b| a.total_cmp(b));
                numbers.dedup_by(|a, b| a == b);
                LabelEncoder::Numeric(numbers)
            }
            None => {
                let mut text: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                text.sort();
                text.dedup();
                LabelEncoder::Text(text)
            }
        }
    }

    /// Code of a value seen during `fit`
    pub fn transform(&self, value: &str) -> Option<usize> {
        match self {
            LabelEncoder::Numeric(classes) => {
                let number = value.parse::<f64>().ok()?;
                classes
                    .binary_search_by(|c| c.partial_cmp(&number).unwrap_or(Ordering::Less))
                    .ok()
            }
            LabelEncoder::Text(classes) => classes.binary_search_by(|c| c.as_str().cmp(value)).ok(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LabelEncoder::Numeric(classes) => classes.len(),
            LabelEncoder::Text(classes) => classes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cleaned dataset in [`COLUMN_NAMES`] order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanTable {
    pub rows: Vec<[f64; WIDTH]>,
}

impl CleanTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMN_NAMES
    }

    pub fn features(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| row[..FEATURE_COUNT].to_vec())
            .collect()
    }

    pub fn targets(&self) -> Vec<u8> {
        self.rows
            .iter()
            .map(|row| u8::from(row[TARGET_INDEX] != 0.0))
            .collect()
    }

    /// Values of one column by name
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = COLUMN_NAMES.iter().position(|c| *c == name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Render back into a headerless raw table
    pub fn to_raw(&self) -> RawTable {
        RawTable::new(
            self.rows
                .iter()
                .map(|row| row.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        )
    }

    /// Write as CSV with a header row
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_to(file)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(COLUMN_NAMES)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a CSV previously produced by [`CleanTable::write_csv`]
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != WIDTH {
                return Err(DataError::UnexpectedSchema {
                    expected: WIDTH,
                    row: index,
                    found: record.len(),
                });
            }
            let mut row = [0.0; WIDTH];
            for (column, (slot, cell)) in row.iter_mut().zip(record.iter()).enumerate() {
                *slot = parse_number(cell, index, column)?;
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }
}

/// Clean a raw headerless table
///
/// Every row must have exactly 14 cells. Rows containing a missing value (or a
/// NaN) are dropped; a non-numeric cell in a numeric column is an error.
pub fn clean_dataset(raw: &RawTable) -> Result<CleanTable> {
    let categorical: Vec<usize> = CATEGORICAL_COLUMNS
        .iter()
        .filter_map(|name| COLUMN_NAMES.iter().position(|c| c == name))
        .collect();

    let mut kept: Vec<(&[Option<String>], [f64; WIDTH])> = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    'rows: for (index, row) in raw.rows.iter().enumerate() {
        if row.len() != WIDTH {
            return Err(DataError::UnexpectedSchema {
                expected: WIDTH,
                row: index,
                found: row.len(),
            });
        }
        if row.iter().any(Option::is_none) {
            dropped += 1;
            continue;
        }

        let mut numeric = [0.0; WIDTH];
        for (column, cell) in row.iter().enumerate() {
            if categorical.contains(&column) {
                continue;
            }
            let value = parse_number(cell.as_deref().unwrap_or_default(), index, column)?;
            if value.is_nan() {
                dropped += 1;
                continue 'rows;
            }
            numeric[column] = value;
        }
        kept.push((row.as_slice(), numeric));
    }

    for &column in &categorical {
        let encoder = LabelEncoder::fit(
            kept.iter()
                .map(|(row, _)| row[column].as_deref().unwrap_or_default()),
        );
        debug!(
            column = COLUMN_NAMES[column],
            classes = encoder.len(),
            "fitted label encoder"
        );
        for (row, values) in kept.iter_mut() {
            let cell = row[column].as_deref().unwrap_or_default();
            values[column] = encoder.transform(cell).unwrap_or_default() as f64;
        }
    }

    let rows: Vec<[f64; WIDTH]> = kept
        .into_iter()
        .map(|(_, mut values)| {
            values[TARGET_INDEX] = if values[TARGET_INDEX] != 0.0 { 1.0 } else { 0.0 };
            values
        })
        .collect();

    info!(rows = rows.len(), dropped, "dataset cleaned");
    Ok(CleanTable { rows })
}

fn parse_number(cell: &str, row: usize, column: usize) -> Result<f64> {
    cell.parse::<f64>().map_err(|_| DataError::NonNumeric {
        row,
        column: COLUMN_NAMES[column].to_string(),
        value: cell.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawTable {
        RawTable::from_reader(text.as_bytes()).unwrap()
    }

    const SAMPLE: &str = "\
63.0,1.0,1.0,145.0,233.0,1.0,2.0,150.0,0.0,2.3,3.0,0.0,6.0,0
67.0,1.0,4.0,160.0,286.0,0.0,2.0,108.0,1.0,1.5,2.0,3.0,3.0,2
67.0,1.0,4.0,120.0,229.0,0.0,2.0,129.0,1.0,2.6,2.0,2.0,7.0,1
37.0,1.0,3.0,130.0,250.0,0.0,0.0,187.0,0.0,3.5,3.0,?,3.0,0
";

    #[test]
    fn drops_missing_and_binarizes_target() {
        let clean = clean_dataset(&raw(SAMPLE)).unwrap();

        assert_eq!(clean.len(), 3);
        assert_eq!(clean.columns().len(), 14);
        assert_eq!(clean.targets(), vec![0, 1, 1]);
        assert_eq!(clean.column("target").unwrap(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn encodes_categorical_columns_in_numeric_order() {
        let clean = clean_dataset(&raw(SAMPLE)).unwrap();

        // thal values 6, 3, 7 -> classes [3, 6, 7]
        assert_eq!(clean.column("thal").unwrap(), vec![1.0, 0.0, 2.0]);
        // cp values 1, 4, 4 -> classes [1, 4]
        assert_eq!(clean.column("cp").unwrap(), vec![0.0, 1.0, 1.0]);
        // numeric columns are untouched
        assert_eq!(clean.column("chol").unwrap(), vec![233.0, 286.0, 229.0]);
    }

    #[test]
    fn text_categories_sort_lexicographically() {
        let encoder = LabelEncoder::fit(["normal", "fixed", "reversible", "fixed"]);
        assert_eq!(encoder.len(), 3);
        assert_eq!(encoder.transform("fixed"), Some(0));
        assert_eq!(encoder.transform("reversible"), Some(2));
        assert_eq!(encoder.transform("unknown"), None);
    }

    #[test]
    fn numeric_encoder_merges_equal_spellings() {
        let encoder = LabelEncoder::fit(["10", "9", "9.0"]);
        assert_eq!(encoder, LabelEncoder::Numeric(vec![9.0, 10.0]));
        assert_eq!(encoder.transform("9.0"), Some(0));
        assert_eq!(encoder.transform("10"), Some(1));
    }

    #[test]
    fn wrong_width_is_unexpected_schema() {
        let err = clean_dataset(&raw("1,2,3\n")).unwrap_err();
        assert!(matches!(
            err,
            DataError::UnexpectedSchema {
                expected: 14,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn text_in_numeric_column_is_rejected() {
        let err =
            clean_dataset(&raw("old,1,1,145,233,1,2,150,0,2.3,3,0,6,0\n")).unwrap_err();
        assert!(matches!(err, DataError::NonNumeric { ref column, .. } if column == "age"));
    }

    #[test]
    fn csv_round_trip_keeps_values() {
        let clean = clean_dataset(&raw(SAMPLE)).unwrap();
        let mut buffer = Vec::new();
        clean.write_to(&mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("age,sex,cp"));
        assert_eq!(CleanTable::from_reader(buffer.as_slice()).unwrap(), clean);
    }
}
