//! Error types for Plugdock

use thiserror::Error;

/// Result type for Plugdock operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Plugdock
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
