//! Error types for the satellite agent

use thiserror::Error;

/// Main error type for the satellite agent
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Container engine error: {0}")]
    DockerError(#[from] bollard::errors::Error),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("Model server error: {0}")]
    ModelServerError(String),

    #[error("Task error: {0}")]
    TaskError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Satellite not paired: {0}")]
    NotPaired(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Internal(err.to_string())
    }
}
