//! Stale-tolerant response cache keyed by content-derived hashes.
//!
//! The pipeline only ever talks to the [`ResponseCache`] trait, so the
//! file-backed store can be swapped for an in-memory map (used in tests) or a
//! networked cache without touching the request handling logic.
//!
//! # Freshness vs. fallback
//!
//! An entry is *fresh* while its age is below the configured TTL; fresh hits
//! are served without contacting upstream. Entries are never deleted: a stale
//! entry still acts as a fallback when upstream is unreachable. Growth is
//! unbounded per distinct query shape by design.
//!
//! # Concurrency
//!
//! Distinct keys live in distinct files, so concurrent requests for different
//! filter combinations never contend. Identical keys race with
//! last-writer-wins semantics; the write path goes through a temp file and an
//! atomic rename so a concurrent reader never observes a partial entry.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// A cached payload together with its age at read time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored JSON payload, exactly as written
    pub payload: String,
    /// Time elapsed since the entry was last written
    pub age: Duration,
}

impl CacheEntry {
    /// Fresh entries are served without contacting upstream.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age < ttl
    }
}

/// Keyed payload store with TTL-on-read semantics.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up an entry. `None` means no entry has ever been written.
    async fn get(&self, key: &str) -> AppResult<Option<CacheEntry>>;

    /// Write (or overwrite) the entry for `key`.
    async fn put(&self, key: &str, payload: &str) -> AppResult<()>;
}

/// File-backed cache: one JSON payload per key under a directory, named by
/// the key itself (already a hex hash). Age comes from the file mtime.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Create a file cache rooted at `dir`. The directory is created lazily
    /// on first write.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl ResponseCache for FileCache {
    async fn get(&self, key: &str) -> AppResult<Option<CacheEntry>> {
        let path = self.entry_path(key);

        let payload = match fs::read_to_string(&path).await {
            Ok(payload) => payload,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Cache(format!("read {}: {e}", path.display()))),
        };

        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| AppError::Cache(format!("stat {}: {e}", path.display())))?;
        let age = metadata
            .modified()
            .ok()
            .and_then(|mtime| mtime.elapsed().ok())
            .unwrap_or_else(|| {
                // Clock skew can make mtime appear to be in the future;
                // treat such entries as just written
                warn!(key, "Cache entry mtime is in the future, treating as fresh");
                Duration::ZERO
            });

        debug!(key, age_secs = age.as_secs(), "Cache entry found");
        Ok(Some(CacheEntry { payload, age }))
    }

    async fn put(&self, key: &str, payload: &str) -> AppResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Cache(format!("mkdir {}: {e}", self.dir.display())))?;

        // Write to a sibling temp file, then rename. Rename is atomic on the
        // same filesystem, so readers see the old entry or the new one,
        // never a partial write.
        let path = self.entry_path(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));

        fs::write(&tmp, payload)
            .await
            .map_err(|e| AppError::Cache(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::Cache(format!("rename {}: {e}", path.display())))?;

        debug!(key, bytes = payload.len(), "Cache entry written");
        Ok(())
    }
}

/// In-memory cache for tests and single-process deployments.
pub struct MemoryCache {
    entries: tokio::sync::RwLock<std::collections::HashMap<String, (String, std::time::Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<CacheEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|(payload, written)| CacheEntry {
            payload: payload.clone(),
            age: written.elapsed(),
        }))
    }

    async fn put(&self, key: &str, payload: &str) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            (payload.to_string(), std::time::Instant::now()),
        );
        Ok(())
    }
}
