//! Persistent artwork store with byte-budget LRU eviction.
//!
//! Each entry owns one JPEG file in the cache directory, named after its
//! cache key, plus a row in the `artwork_cache` index. The row and the file
//! are created together by [`ArtworkCache::put`] and removed together by
//! eviction or [`ArtworkCache::clear`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension, Row, types::Type};

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::metadata::TrackMetadata;
use crate::publish::atomic_write;

/// File name of the SQLite index inside the cache directory.
pub const INDEX_FILE: &str = "cache_index.db";

const ENTRY_COLUMNS: &str = "cache_key, search_term, file_path, metadata_json, artwork_url,
     file_size, created_at, last_accessed_at, access_count";

/// A cached piece of artwork.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub cache_key: String,
    pub search_term: String,
    pub file_path: PathBuf,
    pub metadata: TrackMetadata,
    pub artwork_url: String,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
}

/// Aggregate numbers for the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entry_count: u64,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
    pub total_accesses: u64,
}

/// Strictly increasing microsecond timestamps.
///
/// Two touches within the same wall-clock microsecond still get distinct
/// `last_accessed_at` values, so LRU order is total.
#[derive(Debug, Default)]
struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    fn seeded(last: i64) -> Self {
        Self { last: AtomicI64::new(last) }
    }

    fn now_micros(&self) -> i64 {
        let wall = Utc::now().timestamp_micros();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev + 1);
            match self.last.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return next,
                Err(observed) => prev = observed,
            }
        }
    }
}

fn micros_to_datetime(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CacheEntry> {
    let metadata_json: String = row.get(3)?;
    let metadata = serde_json::from_str(&metadata_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    let file_path: String = row.get(2)?;

    Ok(CacheEntry {
        cache_key: row.get(0)?,
        search_term: row.get(1)?,
        file_path: PathBuf::from(file_path),
        metadata,
        artwork_url: row.get(4)?,
        file_size: row.get::<_, i64>(5)?.max(0) as u64,
        created_at: micros_to_datetime(row.get(6)?),
        last_accessed_at: micros_to_datetime(row.get(7)?),
        access_count: row.get::<_, i64>(8)?.max(0) as u64,
    })
}

/// Remove a backing file, tolerating one that is already gone.
fn remove_backing_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to delete cached artwork"),
    }
}

/// Artwork cache rooted at one directory.
#[derive(Debug, Clone)]
pub struct ArtworkCache {
    db: CacheDb,
    dir: PathBuf,
    max_bytes: u64,
    eviction_target: f64,
    clock: Arc<MonotonicClock>,
}

impl ArtworkCache {
    /// Open (or create) the cache directory and its index.
    ///
    /// `eviction_target` is the fraction of `max_bytes` a cleanup pass
    /// shrinks the cache down to once the budget is exceeded.
    pub async fn open(dir: impl Into<PathBuf>, max_bytes: u64, eviction_target: f64) -> Result<Self, Error> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        let db = CacheDb::open(dir.join(INDEX_FILE)).await?;

        let newest: i64 = db
            .conn
            .call(|conn| {
                conn.query_row("SELECT COALESCE(MAX(last_accessed_at), 0) FROM artwork_cache", [], |row| row.get(0))
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(dir = %dir.display(), max_bytes, eviction_target, "opened artwork cache");
        Ok(Self { db, dir, max_bytes, eviction_target, clock: Arc::new(MonotonicClock::seeded(newest)) })
    }

    /// Handle to the shared index database.
    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Look up a search term, recording the access on a hit.
    ///
    /// An entry whose backing file has disappeared is deleted and reported
    /// as a miss.
    pub async fn lookup(&self, term: &str) -> Result<Option<CacheEntry>, Error> {
        let key = compute_cache_key(term);
        let now = self.clock.now_micros();

        self.db
            .conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let tx = conn.transaction()?;
                let found = tx
                    .query_row(
                        &format!("SELECT {ENTRY_COLUMNS} FROM artwork_cache WHERE cache_key = ?1"),
                        params![key],
                        entry_from_row,
                    )
                    .optional()?;

                let Some(mut entry) = found else {
                    return Ok(None);
                };

                if !entry.file_path.is_file() {
                    tx.execute("DELETE FROM artwork_cache WHERE cache_key = ?1", params![key])?;
                    tx.commit()?;
                    tracing::warn!(
                        key = %entry.cache_key,
                        path = %entry.file_path.display(),
                        "cached artwork file missing, dropped stale entry"
                    );
                    return Ok(None);
                }

                tx.execute(
                    "UPDATE artwork_cache
                     SET last_accessed_at = ?1, access_count = access_count + 1
                     WHERE cache_key = ?2",
                    params![now, key],
                )?;
                tx.commit()?;

                entry.last_accessed_at = micros_to_datetime(now);
                entry.access_count += 1;
                Ok(Some(entry))
            })
            .await
            .map_err(Error::from)
    }

    /// Store artwork for a search term and return the path of its file.
    ///
    /// Re-inserting an existing term replaces the image and metadata but
    /// keeps its access count and creation time.
    pub async fn put(
        &self, term: &str, image: &[u8], metadata: &TrackMetadata, artwork_url: &str,
    ) -> Result<PathBuf, Error> {
        let term = term.trim().to_string();
        if term.is_empty() {
            return Err(Error::InvalidInput("search term must not be empty".into()));
        }

        let key = compute_cache_key(&term);
        let path = self.dir.join(format!("{key}.jpg"));
        let file_size = image.len() as i64;

        let bytes = image.to_vec();
        let target = path.clone();

        let metadata_json = serde_json::to_string(metadata).map_err(|e| Error::Decode(e.to_string()))?;
        let artwork_url = artwork_url.to_string();
        let file_path = path.to_string_lossy().into_owned();
        let now = self.clock.now_micros();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                // Written on the connection thread so eviction cannot run
                // between the file landing and its row being upserted.
                atomic_write(&target, &bytes)?;
                conn.execute(
                    "INSERT INTO artwork_cache (
                        cache_key, search_term, file_path, metadata_json, artwork_url,
                        file_size, created_at, last_accessed_at, access_count
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, 0)
                    ON CONFLICT(cache_key) DO UPDATE SET
                        search_term = excluded.search_term,
                        file_path = excluded.file_path,
                        metadata_json = excluded.metadata_json,
                        artwork_url = excluded.artwork_url,
                        file_size = excluded.file_size,
                        last_accessed_at = excluded.last_accessed_at",
                    params![key, term, file_path, metadata_json, artwork_url, file_size, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(path = %path.display(), bytes = file_size, "cached artwork");
        self.cleanup_if_needed().await?;
        Ok(path)
    }

    /// Evict least-recently-accessed entries once the budget is exceeded.
    ///
    /// Shrinks the cache to `max_bytes * eviction_target`. Returns the
    /// number of evicted entries.
    pub async fn cleanup_if_needed(&self) -> Result<usize, Error> {
        let max_bytes = self.max_bytes as i64;
        let target_bytes = (self.max_bytes as f64 * self.eviction_target) as i64;

        let evicted = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<(String, i64)>, Error> {
                let tx = conn.transaction()?;
                let mut total: i64 =
                    tx.query_row("SELECT COALESCE(SUM(file_size), 0) FROM artwork_cache", [], |row| row.get(0))?;
                if total <= max_bytes {
                    return Ok(Vec::new());
                }

                let oldest_first: Vec<(String, String, i64)> = {
                    let mut stmt = tx.prepare(
                        "SELECT cache_key, file_path, file_size FROM artwork_cache
                         ORDER BY last_accessed_at ASC",
                    )?;
                    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
                    rows.collect::<Result<_, _>>()?
                };

                let mut evicted = Vec::new();
                for (key, file_path, size) in oldest_first {
                    if total <= target_bytes {
                        break;
                    }
                    tx.execute("DELETE FROM artwork_cache WHERE cache_key = ?1", params![key])?;
                    remove_backing_file(Path::new(&file_path));
                    total -= size;
                    evicted.push((key, size));
                }

                tx.commit()?;
                Ok(evicted)
            })
            .await
            .map_err(Error::from)?;

        if !evicted.is_empty() {
            let freed: i64 = evicted.iter().map(|(_, size)| size).sum();
            tracing::info!(evicted = evicted.len(), freed_bytes = freed, "evicted least recently used artwork");
        }
        Ok(evicted.len())
    }

    /// Delete every entry and its file. Returns the number of entries removed.
    pub async fn clear(&self) -> Result<usize, Error> {
        let removed = self
            .db
            .conn
            .call(|conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                let paths: Vec<String> = {
                    let mut stmt = tx.prepare("SELECT file_path FROM artwork_cache")?;
                    let rows = stmt.query_map([], |row| row.get(0))?;
                    rows.collect::<Result<_, _>>()?
                };
                tx.execute("DELETE FROM artwork_cache", [])?;
                tx.commit()?;

                for path in &paths {
                    remove_backing_file(Path::new(path));
                }
                Ok(paths.len())
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(removed, "cleared artwork cache");
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<CacheStats, Error> {
        let max_size_bytes = self.max_bytes;
        self.db
            .conn
            .call(move |conn| -> Result<CacheStats, Error> {
                let stats = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(file_size), 0), COALESCE(SUM(access_count), 0)
                     FROM artwork_cache",
                    [],
                    |row| {
                        Ok(CacheStats {
                            entry_count: row.get::<_, i64>(0)? as u64,
                            total_size_bytes: row.get::<_, i64>(1)? as u64,
                            max_size_bytes,
                            total_accesses: row.get::<_, i64>(2)? as u64,
                        })
                    },
                )?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }

    /// Every entry, most recently accessed first.
    pub async fn list_all(&self) -> Result<Vec<CacheEntry>, Error> {
        self.db
            .conn
            .call(|conn| -> Result<Vec<CacheEntry>, Error> {
                let mut stmt =
                    conn.prepare(&format!("SELECT {ENTRY_COLUMNS} FROM artwork_cache ORDER BY last_accessed_at DESC"))?;
                let rows = stmt.query_map([], entry_from_row)?;
                Ok(rows.collect::<Result<_, _>>()?)
            })
            .await
            .map_err(Error::from)
    }
}
