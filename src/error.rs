use thiserror::Error;

use crate::models::DimensionKey;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed input at line {line}: {reason}")]
    MalformedInput { line: u64, reason: String },

    #[error("Undefined ratio for {indicator} at {key}: summed denominator is zero")]
    UndefinedRatio { indicator: String, key: DimensionKey },

    #[error("Non-finite value for {indicator} at {key}")]
    NonFiniteValue { indicator: String, key: DimensionKey },

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("Unknown indicator: {0}")]
    UnknownIndicator(String),

    #[error("Unknown rollup: {0} (expected sum or mean)")]
    UnknownRollup(String),

    #[error("Invalid indicator registry: {0}")]
    InvalidRegistry(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
