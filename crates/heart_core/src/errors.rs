//! Error types for the core crate

use thiserror::Error;

/// Errors raised by configuration loading and model handling
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration could not be loaded or contained an invalid value
    #[error("configuration error: {0}")]
    Config(String),

    /// Model structure is inconsistent or cannot score the given input
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// Stored hash does not match the model content
    #[error("model integrity check failed: expected {expected}, found {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
