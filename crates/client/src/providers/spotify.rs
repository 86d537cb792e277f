//! Spotify Web API client (client-credentials flow).
//!
//! The access token is fetched lazily and reused until shortly before it
//! expires. A 401 on search drops the cached token so the next call
//! re-authenticates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{Candidate, Provider, ProviderError};
use coverframe_core::TrackMetadata;
use coverframe_core::metadata::{format_track_time, truncate_release_date};

const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Renew the token this long before Spotify says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Artwork at least this wide counts as high resolution.
const HIGH_RES_WIDTH: u32 = 600;

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_url: String,
    pub token_url: String,
    pub timeout: Duration,
}

impl SpotifyConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_url: DEFAULT_API_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Clone, Deserialize)]
struct SpotifyTrack {
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<NamedObject>,
    album: Option<Album>,
    duration_ms: Option<u64>,
    preview_url: Option<String>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedObject {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Album {
    #[serde(default)]
    name: String,
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
struct Image {
    url: String,
    width: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

impl SpotifyTrack {
    fn into_candidate(self) -> Candidate {
        let artist = self.artists.into_iter().next().map(|a| a.name).unwrap_or_default();
        let (album, release_date, images) = match self.album {
            Some(album) => (album.name, album.release_date.unwrap_or_default(), album.images),
            None => (String::new(), String::new(), Vec::new()),
        };

        let largest = images.into_iter().max_by_key(|img| img.width.unwrap_or(0));
        let high_res = largest.as_ref().and_then(|img| img.width).is_some_and(|w| w >= HIGH_RES_WIDTH);
        let artwork_url = largest.map(|img| img.url);

        let metadata = TrackMetadata {
            title: self.name.clone(),
            artist: artist.clone(),
            album: album.clone(),
            genre: String::new(),
            release_date: truncate_release_date(&release_date),
            track_time: format_track_time(self.duration_ms),
            preview_url: self.preview_url.unwrap_or_default(),
            itunes_url: None,
            spotify_url: Some(self.external_urls.and_then(|u| u.spotify).unwrap_or_default()),
        }
        .with_unknown_defaults();

        Candidate { title: self.name, artist, album, high_res, artwork_url, metadata }
    }
}

/// Spotify search client.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    config: SpotifyConfig,
    token: Arc<Mutex<Option<AccessToken>>>,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Result<Self, ProviderError> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(ProviderError::MissingCredentials("spotify"));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Network(Arc::new(e)))?;

        Ok(Self { http, config, token: Arc::new(Mutex::new(None)) })
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref()
            && Instant::now() < token.expires_at
        {
            return Ok(token.value.clone());
        }

        tracing::debug!("requesting Spotify access token");
        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(status));
        }

        let body: TokenResponse = response.json().await.map_err(|e| ProviderError::Parse(e.to_string()))?;
        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *guard = Some(AccessToken { value: body.access_token.clone(), expires_at: Instant::now() + lifetime });

        Ok(body.access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl Provider for SpotifyClient {
    fn name(&self) -> &'static str {
        "spotify"
    }

    async fn search(&self, term: &str) -> Result<Vec<Candidate>, ProviderError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ProviderError::InvalidQuery("search term cannot be empty".into()));
        }

        let token = self.access_token().await?;
        let url = format!("{}/search", self.config.api_url);
        tracing::debug!(term, "searching Spotify");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("q", term), ("type", "track"), ("limit", "5")])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
        }
        if !status.is_success() {
            return Err(ProviderError::from_status(status));
        }

        let bytes = response.bytes().await?;
        let parsed: SearchResponse = serde_json::from_slice(&bytes).map_err(|e| ProviderError::Parse(e.to_string()))?;

        let items = parsed.tracks.map(|page| page.items).unwrap_or_default();
        tracing::debug!(results = items.len(), "Spotify search completed");
        Ok(items.into_iter().map(SpotifyTrack::into_candidate).collect())
    }
}
