use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// All errors produced by the waste dashboard crates.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV source could not be tokenised.
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document (config, model or scaler) could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A date or required value is missing or unparseable at load time.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A required column is absent from a source.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A date-range filter was given a start after its end.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// A statistic was requested over zero values.
    #[error("Empty table: no values for column \"{0}\"")]
    EmptyTable(String),

    /// A statistic needs more rows than the table holds.
    #[error("Insufficient data: need at least {required} values, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A ratio met a zero denominator.
    #[error("Division by zero at row {index}")]
    DivisionByZero { index: usize },

    /// A metric column name is not part of the table schema.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Two paired series do not have the same length.
    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    /// The inference model or one of its scalers rejected its input.
    #[error("Inference error: {0}")]
    Inference(String),

    /// An expected data source does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
