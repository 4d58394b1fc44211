//! Unified error handling for creditgate-core

use thiserror::Error;

use crate::services::usage::UsageError;

/// Core error type for creditgate-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for creditgate-core
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
