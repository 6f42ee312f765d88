// src/error.rs

use arrow::error::ArrowError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning the configured track CSVs into the observation table.
///
/// Every variant is fatal at startup: the server never binds without a
/// complete table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("track file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input in {}: {reason}", path.display())]
    MalformedInput { path: PathBuf, reason: String },

    #[error("column `{column}` in {} is not a valid YYYYMMDD date", path.display())]
    DateParse { path: PathBuf, column: String },

    #[error("building observation table: {0}")]
    Arrow(#[from] ArrowError),
}

/// Per-request failures raised while routing a browser event to a view update.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no callback registered for {id}.{property}")]
    UnknownCallback { id: String, property: String },

    #[error("update request carried no inputs")]
    NoInputs,

    #[error("bad payload: {0}")]
    BadPayload(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ArrowError> for DispatchError {
    fn from(err: ArrowError) -> Self {
        DispatchError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Internal(err.to_string())
    }
}

/// Bad process configuration (environment or embedded track list).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a TCP port number, got `{0}`")]
    InvalidPort(String),

    #[error("invalid track list: {0}")]
    Tracks(#[from] serde_yaml::Error),

    #[error("track list is empty")]
    NoTracks,
}
