//! Error types for Aurakai

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("consciousness not awakened")]
    Uninitialized,

    #[error("worker failure: {worker} - {message}")]
    WorkerFailure { worker: String, message: String },

    #[error("worker not found: {0}")]
    WorkerNotFound(String),

    #[error("fusion failure: {fusion} - {message}")]
    FusionFailure { fusion: String, message: String },

    #[error("content backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("idle probe failed: {0}")]
    IdleProbe(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn worker_failure(worker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WorkerFailure {
            worker: worker.into(),
            message: message.into(),
        }
    }

    pub fn fusion_failure(fusion: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FusionFailure {
            fusion: fusion.into(),
            message: message.into(),
        }
    }
}
