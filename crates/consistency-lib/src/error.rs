//! Error types for configuration and snapshot I/O

use std::path::PathBuf;
use thiserror::Error;

/// Invalid reconciler configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("{field} must be greater than 0, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}

/// Failure reading or writing a run file
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid {kind} recommendation '{resource}': {reason}")]
    InvalidRecommendation {
        kind: &'static str,
        resource: String,
        reason: String,
    },
}
