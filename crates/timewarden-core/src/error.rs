//! Core error types for timewarden-core.
//!
//! Every fallible operation in the library returns [`CoreError`] (or a more
//! specific sub-error that converts into it). The engine never treats an
//! error as fatal: queued operations log their failure and the queue moves
//! on to the next operation.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for timewarden-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A browser capability call failed
    #[error("Browser capability '{capability}' failed: {message}")]
    Capability {
        capability: &'static str,
        message: String,
    },

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

impl CoreError {
    /// Wrap a capability failure with the capability's name.
    pub fn capability(capability: &'static str, err: impl std::fmt::Display) -> Self {
        CoreError::Capability {
            capability,
            message: err.to_string(),
        }
    }
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored document could not be decoded
    #[error("Corrupt value under key '{key}': {message}")]
    Corrupt { key: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A hostname is not in normal form (lowercase, no scheme/path/port)
    #[error("Invalid hostname: '{0}'")]
    InvalidHostname(String),

    /// A "HH:MM" reset-time string failed to parse
    #[error("Invalid reset time '{0}': expected HH:MM")]
    InvalidResetTime(String),

    /// A numeric field is outside its allowed range
    #[error("Value {value} for '{field}' out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Invalid value with context
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
