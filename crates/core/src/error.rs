//! Error types for bx-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for bx-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bx-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Network failure, timeout or cancelled request
    #[error("Transport error: {0}")]
    Transport(String),

    /// Missing object, bucket or multipart session
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rename/move collision or precondition failure
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed name, path or key
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server failed or misbehaved (5xx, endless pagination)
    #[error("Server error: {0}")]
    Server(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Alias not found
    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    /// Alias already exists
    #[error("Alias already exists: {0}")]
    AliasExists(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Map an HTTP status code and response body to an error kind
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 => Error::Validation(message),
            401 | 403 => Error::Auth(message),
            404 => Error::NotFound(message),
            409 | 412 => Error::Conflict(message),
            500..=599 => Error::Server(message),
            _ => Error::Transport(format!("unexpected status {status}: {message}")),
        }
    }

    /// Whether the caller may reasonably retry the failed call
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Server(_))
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::Config(_) | Error::Validation(_) => 2, // UsageError
            Error::Transport(_) | Error::Server(_) => 3,                          // NetworkError
            Error::Auth(_) => 4,                                                   // AuthError
            Error::NotFound(_) | Error::AliasNotFound(_) => 5,                     // NotFound
            Error::Conflict(_) | Error::AliasExists(_) => 6,                       // Conflict
            _ => 1,                                                                // GeneralError
        }
    }
}
