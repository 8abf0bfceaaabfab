//! Error types for the core crate.

use thiserror::Error;

/// Canvas errors.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Set `withTimestamp` to track sketching time")]
    TimestampDisabled,
    #[error("Invalid path data: {0}")]
    InvalidPaths(#[source] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[source] serde_json::Error),
    #[error("Invalid preserveAspectRatio value: {0}")]
    InvalidAspectRatio(String),
}

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;
