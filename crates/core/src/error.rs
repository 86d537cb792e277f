//! Unified error types for coverframe.
//!
//! The `Display` output of every variant starts with a stable upper-case code
//! so the control surface and logs can be grepped by failure class.

use tokio_rusqlite::rusqlite;

use crate::retry::Retryable;

/// Unified error types for the fetch, cache, and publish side.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty search term).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No provider returned a usable candidate.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Transient network failure, surfaced after retries are exhausted.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Malformed image or metadata payload.
    #[error("DECODE_ERROR: {0}")]
    Decode(String),

    /// Disk write, fsync, or rename failure.
    #[error("STORAGE_ERROR: {0}")]
    Storage(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Configuration could not be loaded or is invalid.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl Error {
    /// Short machine-readable code, the prefix of the display string.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Network(_) => "NETWORK_ERROR",
            Error::Decode(_) => "DECODE_ERROR",
            Error::Storage(_) => "STORAGE_ERROR",
            Error::Database(_) | Error::MigrationFailed(_) => "CACHE_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl Retryable for Error {
    fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Storage(format!("rename failed: {}", err.error))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Storage(format!("blocking task failed: {err}"))
    }
}
