//! iTunes Search API client.
//!
//! ### Specification
//!
//! - **Endpoint**: `https://itunes.apple.com/search`
//! - **Authentication**: none.
//! - **Query**: `term`, `entity=song`, `limit=5`, `media=music`.
//! - **Artwork**: `artworkUrl100` (falling back to `artworkUrl60`) with the
//!   `NNNxNNNbb` size token rewritten to the configured target size.

pub mod request;
pub mod response;

pub use request::SearchRequest;
pub use response::{ItunesApiResponse, ItunesTrack};

use async_trait::async_trait;
use reqwest::header;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Candidate, Provider, ProviderError};

/// Default base URL for the iTunes Search API.
const DEFAULT_BASE_URL: &str = "https://itunes.apple.com";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = "coverframe/0.1";

/// iTunes client configuration.
#[derive(Debug, Clone)]
pub struct ItunesConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Edge length written into artwork URLs.
    pub target_size: u32,
}

impl Default for ItunesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            target_size: 720,
        }
    }
}

/// iTunes Search API client.
#[derive(Debug, Clone)]
pub struct ItunesClient {
    http: reqwest::Client,
    config: ItunesConfig,
}

impl ItunesClient {
    pub fn new(config: ItunesConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ProviderError::Network(Arc::new(e)))?;

        Ok(Self { http, config })
    }

    /// Execute one search request and return the raw tracks.
    pub async fn search_tracks(&self, req: &SearchRequest) -> Result<Vec<ItunesTrack>, ProviderError> {
        req.validate()?;

        let start = Instant::now();
        let url = format!("{}/search", self.config.base_url);
        tracing::debug!(term = %req.term, "searching iTunes");

        let http_response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(req)
            .send()
            .await?;

        let status = http_response.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(status));
        }

        let bytes = http_response.bytes().await?;
        let api_response: ItunesApiResponse =
            serde_json::from_slice(&bytes).map_err(|e| ProviderError::Parse(e.to_string()))?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            results = api_response.results.len(),
            "iTunes search completed"
        );

        Ok(api_response.results)
    }
}

#[async_trait]
impl Provider for ItunesClient {
    fn name(&self) -> &'static str {
        "itunes"
    }

    async fn search(&self, term: &str) -> Result<Vec<Candidate>, ProviderError> {
        let tracks = self.search_tracks(&SearchRequest::new(term.trim())).await?;
        Ok(tracks.into_iter().map(|t| t.into_candidate(self.config.target_size)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ItunesConfig::default();
        assert_eq!(config.base_url, "https://itunes.apple.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.target_size, 720);
    }

    #[tokio::test]
    async fn test_empty_term_rejected_before_network() {
        let client = ItunesClient::new(ItunesConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        })
        .unwrap();
        let result = client.search("  ").await;
        assert!(matches!(result, Err(ProviderError::InvalidQuery(_))));
    }

    #[test]
    fn test_provider_name() {
        let client = ItunesClient::new(ItunesConfig::default()).unwrap();
        assert_eq!(client.name(), "itunes");
    }
}
