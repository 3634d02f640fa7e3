//! Error types for solc-fetch

use thiserror::Error;

/// Errors that can occur while providing a compiler binary
#[derive(Error, Debug)]
pub enum FetchError {
    /// Version string is empty or not a plain dotted identifier
    #[error("invalid compiler version: {0:?}")]
    InvalidVersion(String),

    /// Configured local binary does not exist
    #[error("compiler binary not found at path: {0}")]
    BinaryNotFound(String),

    /// Release server answered with a non-success status
    #[error("download of {url} failed with HTTP status {status}")]
    Status { url: String, status: u16 },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.to_string())
    }
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, FetchError>;
