//! SQLite-backed artwork cache.
//!
//! This module provides a persistent cache using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - Case-insensitive SHA-256 keys derived from search terms
//! - Byte-budget LRU eviction of artwork files
//! - A short-term TTL cache of provider answers in the same database
//! - Automatic schema migrations and WAL mode

pub mod artwork;
pub mod connection;
pub mod hash;
pub mod migrations;
pub mod search;

pub use crate::Error;

pub use artwork::{ArtworkCache, CacheEntry, CacheStats};
pub use connection::CacheDb;
pub use hash::{compute_cache_key, normalize_search_term};
pub use search::CachedSearch;
