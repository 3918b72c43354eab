//! Error types for the Floodgate crate.

use thiserror::Error;

/// Main error type for Floodgate operations.
#[derive(Error, Debug)]
pub enum FloodgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid limiter parameters
    #[error("Limiter error: {0}")]
    Limit(String),

    /// Errors talking to the shared store. No admission decision was made;
    /// callers must not treat this as a denial without an explicit policy.
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Floodgate operations.
pub type Result<T> = std::result::Result<T, FloodgateError>;
