//! Music metadata providers.
//!
//! Each provider turns a free-text search term into a short list of
//! candidates. The fetch pipeline queries providers in priority order and
//! ranks the candidates of the first one that answers with
//! [`scoring::select_best`].

pub mod error;
pub mod itunes;
pub mod scoring;
pub mod spotify;

pub use error::ProviderError;
pub use itunes::ItunesClient;
pub use spotify::SpotifyClient;

use async_trait::async_trait;
use coverframe_core::TrackMetadata;

/// One search hit from a provider.
///
/// `title`, `artist` and `album` hold the raw provider strings used for
/// scoring (empty when the provider omitted them); `metadata` is the record
/// that gets published.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Whether the provider offered its larger artwork rendition.
    pub high_res: bool,
    /// Artwork URL already rewritten to the target size.
    pub artwork_url: Option<String>,
    pub metadata: TrackMetadata,
}

/// A music metadata search API.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short lower-case name used in logs and fetch outcomes.
    fn name(&self) -> &'static str;

    /// Search for tracks matching `term`, in provider ranking order.
    async fn search(&self, term: &str) -> Result<Vec<Candidate>, ProviderError>;
}
