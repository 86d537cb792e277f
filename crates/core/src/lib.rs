//! Core types and shared functionality for coverframe.
//!
//! This crate provides:
//! - The on-disk artwork cache with LRU eviction (SQLite index)
//! - Atomic publishing of the current artwork, metadata, and status
//! - The retry executor used around network calls
//! - Unified error types and layered configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod metadata;
pub mod publish;
pub mod retry;
pub mod status;

pub use cache::{ArtworkCache, CacheDb, CacheEntry, CacheStats, CachedSearch};
pub use config::AppConfig;
pub use error::Error;
pub use metadata::TrackMetadata;
pub use publish::Publisher;
pub use retry::{RetryPolicy, Retryable, retry};
pub use status::DisplayStatus;
