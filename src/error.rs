//! Error types for the category builder.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for category builder operations.
#[derive(Error, Debug)]
pub enum CategoryError {
    /// A caller supplied an argument outside its domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Aggregation was asked to combine zero seeds.
    #[error("Empty seed set: at least one weighted seed is required")]
    EmptySeeds,

    /// A required table file does not exist.
    #[error("Store not found: {0} (run `category_builder ingest` first)")]
    StoreMissing(PathBuf),

    /// A table file exists but cannot be used.
    #[error("Corrupted table {path}: {reason}")]
    CorruptedTable {
        /// Offending table file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A stored row cannot be decoded into alternating key/weight pairs.
    #[error("Malformed row for key '{key}': {reason}")]
    MalformedRow {
        /// Key whose row failed to decode.
        key: String,
        /// Decoding failure.
        reason: String,
    },

    /// Corpus input rejected during ingestion.
    #[error("Malformed input {path}: {reason}")]
    MalformedInput {
        /// Input file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// CSV reading or writing error.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Evaluation data could not be used.
    #[error("Evaluation data error: {0}")]
    EvalData(String),
}

/// Result type alias for category builder operations.
pub type Result<T> = std::result::Result<T, CategoryError>;

impl From<bincode::Error> for CategoryError {
    fn from(err: bincode::Error) -> Self {
        CategoryError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for CategoryError {
    fn from(err: serde_json::Error) -> Self {
        CategoryError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for CategoryError {
    fn from(err: csv::Error) -> Self {
        CategoryError::Csv(err.to_string())
    }
}
