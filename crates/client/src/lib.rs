//! Network side of coverframe.
//!
//! This crate provides the music metadata providers (iTunes, Spotify),
//! candidate scoring, the artwork downloader and normalizer, and the fetch
//! pipeline that ties them to the core cache and publisher.

pub mod artwork;
pub mod pipeline;
pub mod providers;

pub use artwork::{ArtworkFetcher, ArtworkSource, FetchConfig, normalize_artwork, upscale_artwork_url};
pub use pipeline::{FetchOutcome, FetchPipeline, FetchSource, PipelineConfig};
pub use providers::{Candidate, ItunesClient, Provider, ProviderError, SpotifyClient};
