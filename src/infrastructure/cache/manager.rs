//! Three-tier cache manager: hot LRU, persistent TTL map, embedding LRU

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::Mutex;

use super::persistent::PersistentTier;
use crate::domain::query::{normalize, QueryResult, ResultSource};
use crate::domain::DomainError;

/// Cache tuning knobs; the defaults mirror production settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub hot_capacity: usize,
    pub embedding_capacity: usize,
    pub persistent_ttl: Duration,
    /// No file path disables persistence (memory-only tiers)
    pub persistent_path: Option<PathBuf>,
    pub flush_every_writes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            hot_capacity: 1000,
            embedding_capacity: 5000,
            persistent_ttl: Duration::from_secs(24 * 3600),
            persistent_path: None,
            flush_every_writes: 10,
        }
    }
}

/// Query results flow through two tiers (hot, persistent); embeddings get
/// their own LRU keyed by normalized text only, shared across scopes.
#[derive(Debug)]
pub struct CacheManager {
    hot: Mutex<LruCache<String, QueryResult>>,
    persistent: PersistentTier,
    embeddings: Mutex<LruCache<String, Vec<f32>>>,
}

impl CacheManager {
    pub async fn open(config: CacheConfig) -> Self {
        let hot_capacity =
            NonZeroUsize::new(config.hot_capacity).unwrap_or(NonZeroUsize::new(1000).unwrap());
        let embedding_capacity = NonZeroUsize::new(config.embedding_capacity)
            .unwrap_or(NonZeroUsize::new(5000).unwrap());

        Self {
            hot: Mutex::new(LruCache::new(hot_capacity)),
            persistent: PersistentTier::open(
                config.persistent_path,
                config.persistent_ttl,
                config.flush_every_writes,
            )
            .await,
            embeddings: Mutex::new(LruCache::new(embedding_capacity)),
        }
    }

    /// Read protocol: hot hit, else persistent hit (not expired) promoted
    /// back into the hot tier, else miss.
    pub async fn get(&self, key: &str) -> Option<(QueryResult, ResultSource)> {
        if let Some(result) = self.hot.lock().await.get(key) {
            return Some((result.clone(), ResultSource::HotCache));
        }

        if let Some(result) = self.persistent.get(key).await {
            self.hot.lock().await.put(key.to_string(), result.clone());
            return Some((result, ResultSource::PersistentCache));
        }

        None
    }

    /// Write-through to the hot and persistent tiers.
    pub async fn put(&self, key: &str, result: QueryResult) {
        self.hot.lock().await.put(key.to_string(), result.clone());
        self.persistent.put(key, result).await;
    }

    /// Embedding cache is keyed by normalized text, not text+scope: the
    /// same text always embeds to the same vector across scopes.
    pub async fn get_embedding(&self, text: &str) -> Option<Vec<f32>> {
        self.embeddings.lock().await.get(&normalize(text)).cloned()
    }

    pub async fn put_embedding(&self, text: &str, embedding: Vec<f32>) {
        self.embeddings.lock().await.put(normalize(text), embedding);
    }

    /// Synchronous flush of the persistent tier (shutdown path).
    pub async fn flush(&self) -> Result<(), DomainError> {
        self.persistent.flush().await
    }

    pub async fn hot_len(&self) -> usize {
        self.hot.lock().await.len()
    }

    pub async fn persistent_len(&self) -> usize {
        self.persistent.len().await
    }
}
