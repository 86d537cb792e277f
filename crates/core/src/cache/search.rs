//! Short-term provider response cache.
//!
//! Remembers which metadata and artwork URL a search term resolved to, so a
//! repeat request skips the provider query. The image itself is not kept
//! here. Entries expire after a TTL and the table is capped by count, oldest
//! `fetched_at` first.

use std::time::Duration;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::metadata::TrackMetadata;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

/// A remembered provider answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSearch {
    pub metadata: TrackMetadata,
    pub artwork_url: String,
}

impl CacheDb {
    /// Get a fresh cached provider answer for a search term.
    ///
    /// Returns None if the term was never cached or its entry has expired.
    pub async fn get_cached_search(&self, term: &str) -> Result<Option<CachedSearch>, Error> {
        let key_hash = compute_cache_key(term);
        let now = Utc::now().timestamp_micros();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let json = conn
                    .query_row(
                        "SELECT response_json FROM search_cache WHERE key_hash = ?1 AND expires_at > ?2",
                        params![key_hash, now],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(json)
            })
            .await
            .map_err(Error::from)?
            .map(|json| serde_json::from_str(&json).map_err(|e| Error::Decode(format!("cached search: {e}"))))
            .transpose()
    }

    /// Insert or replace the cached answer for a search term.
    ///
    /// After the write, entries beyond `capacity` are dropped oldest first.
    pub async fn put_cached_search(
        &self, term: &str, answer: &CachedSearch, ttl: Duration, capacity: usize,
    ) -> Result<(), Error> {
        let key_hash = compute_cache_key(term);
        let term = term.trim().to_string();
        let response_json = serde_json::to_string(answer).map_err(|e| Error::Decode(e.to_string()))?;

        let fetched_at = Utc::now().timestamp_micros();
        let expires_at = fetched_at.saturating_add(ttl.as_micros().min(i64::MAX as u128) as i64);
        let capacity = capacity as i64;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO search_cache (key_hash, search_term, response_json, fetched_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(key_hash) DO UPDATE SET
                        search_term = excluded.search_term,
                        response_json = excluded.response_json,
                        fetched_at = excluded.fetched_at,
                        expires_at = excluded.expires_at",
                    params![key_hash, term, response_json, fetched_at, expires_at],
                )?;
                tx.execute(
                    "DELETE FROM search_cache WHERE key_hash IN (
                        SELECT key_hash FROM search_cache
                        ORDER BY fetched_at DESC, rowid DESC
                        LIMIT -1 OFFSET ?1
                    )",
                    params![capacity],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired search cache entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired_search(&self) -> Result<u64, Error> {
        let now = Utc::now().timestamp_micros();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM search_cache WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Drop every cached provider answer.
    pub async fn clear_search_cache(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> { Ok(conn.execute("DELETE FROM search_cache", [])? as u64) })
            .await
            .map_err(Error::from)
    }

    pub async fn search_cache_len(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM search_cache", [], |row| row.get::<_, i64>(0)))
            .await
            .map(|n| n as u64)
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn answer(title: &str) -> CachedSearch {
        CachedSearch {
            metadata: TrackMetadata { title: title.into(), artist: "Pink Floyd".into(), ..Default::default() },
            artwork_url: format!("https://cdn.example/{title}/600x600bb.jpg"),
        }
    }

    #[tokio::test]
    async fn test_put_and_get_search() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_cached_search("Pink Floyd Time", &answer("Time"), HOUR, 100).await.unwrap();

        let cached = db.get_cached_search("pink floyd time").await.unwrap().unwrap();
        assert_eq!(cached, answer("Time"));
    }

    #[tokio::test]
    async fn test_get_missing_search() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get_cached_search("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_never_fresh() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_cached_search("Money", &answer("Money"), Duration::ZERO, 100).await.unwrap();
        assert!(db.get_cached_search("Money").await.unwrap().is_none());
        assert_eq!(db.purge_expired_search().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_keeps_fresh_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_cached_search("expiring", &answer("a"), Duration::ZERO, 100).await.unwrap();
        db.put_cached_search("fresh", &answer("b"), HOUR, 100).await.unwrap();

        assert_eq!(db.purge_expired_search().await.unwrap(), 1);
        assert!(db.get_cached_search("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for i in 0..5 {
            db.put_cached_search(&format!("term {i}"), &answer(&i.to_string()), HOUR, 3).await.unwrap();
        }

        assert_eq!(db.search_cache_len().await.unwrap(), 3);
        assert!(db.get_cached_search("term 0").await.unwrap().is_none());
        assert!(db.get_cached_search("term 1").await.unwrap().is_none());
        assert!(db.get_cached_search("term 4").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_search() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_cached_search("Echoes", &answer("old"), HOUR, 100).await.unwrap();
        db.put_cached_search("Echoes", &answer("new"), HOUR, 100).await.unwrap();

        assert_eq!(db.get_cached_search("echoes").await.unwrap(), Some(answer("new")));
        assert_eq!(db.search_cache_len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_search_cache() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_cached_search("a", &answer("a"), HOUR, 100).await.unwrap();
        db.put_cached_search("b", &answer("b"), HOUR, 100).await.unwrap();
        assert_eq!(db.clear_search_cache().await.unwrap(), 2);
    }
}
