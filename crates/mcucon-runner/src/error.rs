//! Runner error type.

use std::io;

use thiserror::Error;

/// Errors that stop the runner from starting or keep it from serving.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Http(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),
}

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;
