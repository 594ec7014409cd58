// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::TargetId;

#[derive(Error, Debug)]
pub enum GamedError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("unknown target {0}")]
    TargetNotFound(TargetId),

    /// Control-plane pull/push failure. Retried on the next reconcile tick.
    #[error("Sync failure: {0}")]
    SyncFailure(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for GamedError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        GamedError::Other(anyhow::anyhow!("runtime event channel closed"))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GamedError>;
