//! Error types for the SD-WAN orchestrator

use thiserror::Error;

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Topology error: {0}")]
    TopologyError(String),

    #[error("Directory error: {0}")]
    DirectoryError(String),

    /// The execution channel refused to schedule a command
    #[error("Dispatch to {target} failed: {reason}")]
    DispatchError { target: String, reason: String },

    #[error("Status poll for {command_id} failed: {reason}")]
    PollError { command_id: String, reason: String },

    #[error("Parameter store error: {0}")]
    StoreError(String),

    #[error("Invalid state transition: {0}")]
    StateError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for OrchestratorError {
    fn from(err: anyhow::Error) -> Self {
        OrchestratorError::Internal(err.to_string())
    }
}
