//! Persistent cache tier: TTL-governed map flushed to a flat JSON file

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::query::QueryResult;
use crate::domain::DomainError;

/// One persisted entry with its creation time for TTL checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: QueryResult,
    pub created_at: DateTime<Utc>,
}

/// Unbounded-by-count tier that outlives hot-tier evictions.
///
/// The backing file is a pure performance optimization: versionless, safe to
/// delete, rebuilt from cold cache with no correctness impact. An unreadable
/// file at startup is an empty cache, never a startup failure.
#[derive(Debug)]
pub struct PersistentTier {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    path: Option<PathBuf>,
    ttl: Duration,
    flush_every_writes: usize,
    writes_since_flush: AtomicUsize,
}

impl PersistentTier {
    /// Creates the tier, loading any prior state from `path`.
    pub async fn open(
        path: Option<PathBuf>,
        ttl: Duration,
        flush_every_writes: usize,
    ) -> Self {
        let entries = match &path {
            Some(path) => Self::load_file(path).await,
            None => HashMap::new(),
        };

        Self {
            entries: Arc::new(RwLock::new(entries)),
            path,
            ttl,
            flush_every_writes: flush_every_writes.max(1),
            writes_since_flush: AtomicUsize::new(0),
        }
    }

    async fn load_file(path: &PathBuf) -> HashMap<String, CacheEntry> {
        match tokio::fs::read(path).await {
            Ok(raw) => match serde_json::from_slice(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Persistent cache unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Persistent cache unreadable, starting empty");
                HashMap::new()
            }
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        let age = Utc::now().signed_duration_since(entry.created_at);
        age.to_std().map_or(true, |age| age >= self.ttl)
    }

    /// TTL-checked read; an expired entry is a miss and is lazily removed.
    pub async fn get(&self, key: &str) -> Option<QueryResult> {
        let expired = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !self.is_expired(entry) => return Some(entry.result.clone()),
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.entries.write().await.remove(key);
        }

        None
    }

    pub async fn put(&self, key: &str, result: QueryResult) {
        self.put_entry(
            key,
            CacheEntry {
                result,
                created_at: Utc::now(),
            },
        )
        .await;
    }

    pub async fn put_entry(&self, key: &str, entry: CacheEntry) {
        self.entries.write().await.insert(key.to_string(), entry);

        let writes = self.writes_since_flush.fetch_add(1, Ordering::SeqCst) + 1;
        if writes >= self.flush_every_writes {
            self.writes_since_flush.store(0, Ordering::SeqCst);
            self.spawn_flush();
        }
    }

    /// Flushes off the query path; the synchronous put never waits on disk.
    fn spawn_flush(&self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        let entries = self.entries.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::write_file(&path, &entries).await {
                warn!(path = %path.display(), error = %e, "Persistent cache flush failed");
            }
        });
    }

    /// Synchronous flush for shutdown.
    pub async fn flush(&self) -> Result<(), DomainError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        Self::write_file(path, &self.entries).await?;
        debug!(path = %path.display(), "Persistent cache flushed");
        Ok(())
    }

    async fn write_file(
        path: &PathBuf,
        entries: &RwLock<HashMap<String, CacheEntry>>,
    ) -> Result<(), DomainError> {
        let snapshot = entries.read().await.clone();
        let raw = serde_json::to_vec(&snapshot)
            .map_err(|e| DomainError::cache(format!("serialize cache: {}", e)))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::cache(format!("create cache dir: {}", e)))?;
        }

        tokio::fs::write(path, raw)
            .await
            .map_err(|e| DomainError::cache(format!("write cache file: {}", e)))?;

        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
