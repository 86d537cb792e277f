//! Search term to published artwork.
//!
//! Resolution order for one request, stopping at the first success:
//!
//! 1. Artwork cache hit: republish the cached file and metadata, no network.
//! 2. Short-term search cache hit: skip the provider query, download again.
//! 3. Providers in priority order, each wrapped in the retry executor.
//!
//! A failure at any step leaves the previously published files untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::artwork::{ArtworkSource, normalize_artwork};
use crate::providers::scoring::select_best;
use crate::providers::{Provider, ProviderError};
use coverframe_core::{AppConfig, ArtworkCache, CachedSearch, Error, Publisher, RetryPolicy, TrackMetadata, retry};

/// Knobs the pipeline reads from configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub target_size: u32,
    pub jpeg_quality: u8,
    pub retry: RetryPolicy,
    pub search_ttl: Duration,
    pub search_capacity: usize,
}

impl PipelineConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            target_size: config.target_size(),
            jpeg_quality: config.jpeg_quality(),
            retry: config.retry_policy(),
            search_ttl: config.search_cache_ttl(),
            search_capacity: config.server.search_cache_capacity,
        }
    }
}

/// Where a successful fetch got its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "provider")]
pub enum FetchSource {
    ArtworkCache,
    SearchCache,
    Provider(&'static str),
}

/// Result of a successful fetch.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    pub metadata: TrackMetadata,
    pub source: FetchSource,
    /// The artwork file inside the cache directory.
    pub cached_path: PathBuf,
}

/// Read a cached artwork file. A file removed since the lookup (evicted by a
/// concurrent `put`) is a miss, not an error.
async fn read_cached_image(path: &Path) -> Result<Option<Vec<u8>>, Error> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fetch pipeline wiring the cache, providers, downloader, and publisher.
#[derive(Clone)]
pub struct FetchPipeline {
    cache: ArtworkCache,
    publisher: Publisher,
    providers: Vec<Arc<dyn Provider>>,
    downloader: Arc<dyn ArtworkSource>,
    config: PipelineConfig,
}

impl FetchPipeline {
    pub fn new(
        cache: ArtworkCache, publisher: Publisher, providers: Vec<Arc<dyn Provider>>,
        downloader: Arc<dyn ArtworkSource>, config: PipelineConfig,
    ) -> Self {
        Self { cache, publisher, providers, downloader, config }
    }

    pub fn cache(&self) -> &ArtworkCache {
        &self.cache
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Resolve a search term and publish its artwork as the current content.
    pub async fn fetch(&self, term: &str) -> Result<FetchOutcome, Error> {
        let term = term.trim();
        if term.is_empty() {
            return Err(Error::InvalidInput("search term is required".into()));
        }

        if let Some(entry) = self.cache.lookup(term).await? {
            tracing::debug!(term, access_count = entry.access_count, "artwork cache hit");
            if let Some(image) = read_cached_image(&entry.file_path).await? {
                self.publish(image, entry.metadata.clone()).await?;
                return Ok(FetchOutcome {
                    metadata: entry.metadata,
                    source: FetchSource::ArtworkCache,
                    cached_path: entry.file_path,
                });
            }
            tracing::warn!(term, path = %entry.file_path.display(), "cached artwork evicted before it was read");
        }

        let (answer, source) = match self.cached_answer(term).await {
            Some(answer) => (answer, FetchSource::SearchCache),
            None => {
                let (answer, provider) = self.query_providers(term).await?;
                self.remember_answer(term, &answer).await;
                (answer, FetchSource::Provider(provider))
            }
        };

        let raw = retry(&self.config.retry, || self.downloader.download(&answer.artwork_url)).await?;

        let (size, quality) = (self.config.target_size, self.config.jpeg_quality);
        let jpeg = tokio::task::spawn_blocking(move || normalize_artwork(&raw, size, quality)).await??;

        let cached_path = self.cache.put(term, &jpeg, &answer.metadata, &answer.artwork_url).await?;
        self.publish(jpeg, answer.metadata.clone()).await?;

        tracing::info!(term, title = %answer.metadata.title, ?source, "fetched artwork");
        Ok(FetchOutcome { metadata: answer.metadata, source, cached_path })
    }

    async fn publish(&self, image: Vec<u8>, metadata: TrackMetadata) -> Result<(), Error> {
        let publisher = self.publisher.clone();
        tokio::task::spawn_blocking(move || publisher.publish_content(&image, &metadata)).await?
    }

    /// Short-term cache lookup. Failures degrade to a miss.
    async fn cached_answer(&self, term: &str) -> Option<CachedSearch> {
        match self.cache.db().get_cached_search(term).await {
            Ok(Some(answer)) => {
                tracing::debug!(term, "search cache hit");
                Some(answer)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(term, error = %e, "search cache lookup failed");
                None
            }
        }
    }

    async fn remember_answer(&self, term: &str, answer: &CachedSearch) {
        let db = self.cache.db();
        if let Err(e) = db.put_cached_search(term, answer, self.config.search_ttl, self.config.search_capacity).await {
            tracing::warn!(term, error = %e, "failed to cache provider answer");
        }
    }

    /// Ask providers in order until one returns candidates.
    async fn query_providers(&self, term: &str) -> Result<(CachedSearch, &'static str), Error> {
        let mut last_error: Option<ProviderError> = None;

        for provider in &self.providers {
            let name = provider.name();
            let candidates = match retry(&self.config.retry, || provider.search(term)).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(provider = name, error = %e, "provider search failed");
                    last_error = Some(e);
                    continue;
                }
            };

            let Some(best) = select_best(term, &candidates) else {
                tracing::debug!(provider = name, term, "no results");
                continue;
            };

            let Some(artwork_url) = best.artwork_url.clone() else {
                return Err(Error::NotFound(format!("no album art found for '{term}'")));
            };

            tracing::debug!(provider = name, title = %best.title, artist = %best.artist, "selected candidate");
            return Ok((CachedSearch { metadata: best.metadata.clone(), artwork_url }, name));
        }

        match last_error {
            Some(e) => Err(e.into()),
            None => Err(Error::NotFound(format!("no results found for '{term}'"))),
        }
    }
}
