//! Error handling for sensor payload processing.
//!
//! Provides error types with enough context to tell which record, axis or
//! payload file failed, so callers can render a fallback state.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AquamonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed {axis} in record {index}: '{value}' ({reason})")]
    MalformedCoordinate {
        index: usize,
        axis: CoordinateAxis,
        value: String,
        reason: String,
    },

    #[error("Invalid window size {size}: sampling interval must be at least 1")]
    InvalidWindowSize { size: i64 },

    #[error("Processing cancelled before completion")]
    Cancelled,

    #[error("Worker failed: {reason}")]
    WorkerFailed { reason: String },

    #[error("Input not found at path: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Invalid payload in file: {path} - {source}")]
    InvalidPayload {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Which half of a coordinate pair failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateAxis {
    Latitude,
    Longitude,
}

impl std::fmt::Display for CoordinateAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateAxis::Latitude => write!(f, "latitude"),
            CoordinateAxis::Longitude => write!(f, "longitude"),
        }
    }
}

impl AquamonError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a worker failure error
    pub fn worker_failed(reason: impl Into<String>) -> Self {
        Self::WorkerFailed {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AquamonError>;
