//! Provider and download error types.

use std::sync::Arc;

use coverframe_core::Error;
use coverframe_core::config::ConfigError;
use coverframe_core::retry::Retryable;

/// Errors from music metadata providers and the artwork CDN.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Provider is enabled but has no credentials configured.
    #[error("missing credentials for {0}")]
    MissingCredentials(&'static str),

    /// Invalid search term.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Artwork URL is not an absolute http(s) URL.
    #[error("invalid artwork URL: {0}")]
    InvalidUrl(String),

    /// Authentication failed (credentials rejected).
    #[error("authentication failed")]
    AuthError,

    /// Rate limited by the provider.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Artwork body exceeds the configured limit.
    #[error("artwork too large: {size} bytes exceeds {limit}")]
    TooLarge { size: u64, limit: usize },

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ProviderError::Timeout } else { ProviderError::Network(Arc::new(err)) }
    }
}

impl ProviderError {
    /// Map a non-success HTTP status onto the provider taxonomy.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => ProviderError::AuthError,
            429 => ProviderError::RateLimited,
            code => ProviderError::HttpError { status: code },
        }
    }
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout | ProviderError::Network(_) | ProviderError::RateLimited => true,
            ProviderError::HttpError { status } => *status >= 500,
            _ => false,
        }
    }
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MissingCredentials(provider) => Error::Config(ConfigError::Missing {
                field: format!("music.{provider}"),
                hint: "configure client_id and client_secret".into(),
            }),
            ProviderError::AuthError => Error::Config(ConfigError::Invalid {
                field: "music".into(),
                reason: "provider rejected the configured credentials".into(),
            }),
            ProviderError::InvalidQuery(msg) => Error::InvalidInput(msg),
            ProviderError::InvalidUrl(url) => Error::InvalidInput(format!("invalid artwork URL: {url}")),
            ProviderError::HttpError { status: 404 } => Error::NotFound("artwork URL returned 404".into()),
            ProviderError::TooLarge { .. } | ProviderError::Parse(_) => Error::Decode(err.to_string()),
            ProviderError::RateLimited
            | ProviderError::HttpError { .. }
            | ProviderError::Timeout
            | ProviderError::Network(_) => Error::Network(err.to_string()),
        }
    }
}
