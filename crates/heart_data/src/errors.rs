use thiserror::Error;

/// Errors raised while acquiring or cleaning the dataset
#[derive(Debug, Error)]
pub enum DataError {
    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("no .data file found in {0}")]
    NoDataFile(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unexpected schema: expected {expected} columns, row {row} has {found}")]
    UnexpectedSchema {
        expected: usize,
        row: usize,
        found: usize,
    },

    #[error("non-numeric value {value:?} in column {column} at row {row}")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, DataError>;
