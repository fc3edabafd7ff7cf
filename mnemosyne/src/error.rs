//! Error types for the mnemosyne library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for mnemosyne operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred while writing to or syncing a sink
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error while encoding a record
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Unrecognised level name
    #[error("Invalid log level: {0:?}")]
    InvalidLevel(String),

    /// The tracing bridge could not be installed
    #[error("Subscriber error: {0}")]
    Subscriber(String),
}
