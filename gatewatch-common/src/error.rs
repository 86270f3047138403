//! Common error types for gatewatch

use thiserror::Error;

/// Common result type for gatewatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across gatewatch services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Counter store gave up after repeated write conflicts; the caller must
    /// not assume the increment was applied
    #[error("Counter store unavailable after {attempts} attempts")]
    StoreUnavailable { attempts: u32 },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
