//! Error types for the orbit data pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to callers of the pipeline.
///
/// Failures that only affect one object (an element set SGP4 cannot
/// propagate) never show up here; they are downgraded to the
/// unpropagatable marker inside a batch.
#[derive(Error, Debug)]
pub enum Error {
    /// Record count or element-line format is invalid; fatal to the whole parse
    #[error("Malformed element set record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Cached text could not be decoded or parsed
    #[error("Cached element sets are corrupt: {0}")]
    CacheCorrupt(String),

    /// The upstream mirror could not be fetched
    #[error("Failed to fetch element sets: {0}")]
    FetchFailed(String),

    /// At least one instant of the period sample could not be propagated
    #[error("Orbit path unavailable for {name}: sample {sample} failed to propagate")]
    OrbitPathUnavailable { name: String, sample: usize },

    /// Durable storage I/O failed
    #[error("Storage error on {path:?}: {source}")]
    Store {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration is invalid or unreadable
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrap a std::io::Error with the path it happened on
pub fn store_err(path: impl Into<PathBuf>, err: std::io::Error) -> Error {
    Error::Store {
        path: path.into(),
        source: err,
    }
}

impl Error {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}
