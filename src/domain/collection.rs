//! Collection handles and the loader/index seams

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::query::{MetadataValue, SearchHit};
use crate::domain::DomainError;

/// An already-embedded document as produced by the ingestion pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedDocument {
    pub document: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
}

/// Read-only query interface over one collection's vector index
#[async_trait]
pub trait VectorIndex: Send + Sync + Debug {
    /// Returns up to `max_results` hits sorted ascending by distance
    async fn query(
        &self,
        embedding: &[f32],
        max_results: usize,
    ) -> Result<Vec<SearchHit>, DomainError>;

    /// Number of documents in the index
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A loaded collection: created once per distinct name, never mutated.
/// Reloading means building a new handle and republishing it.
#[derive(Debug, Clone)]
pub struct CollectionHandle {
    pub name: String,
    pub index: Arc<dyn VectorIndex>,
    pub loaded_at: DateTime<Utc>,
}

impl CollectionHandle {
    pub fn new(name: impl Into<String>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            name: name.into(),
            index,
            loaded_at: Utc::now(),
        }
    }
}

/// Per-collection availability, reported on the status surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Loaded,
    Failed,
    NotLoaded,
}

/// Loads a named collection into a queryable index
///
/// The loader is the boundary to the (out-of-scope) ingestion pipeline: it
/// only reads already-embedded collections, it never writes to them.
#[async_trait]
pub trait CollectionLoader: Send + Sync + Debug {
    async fn load(&self, name: &str) -> Result<CollectionHandle, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::time::Duration;

    /// Mock index that returns a fixed hit list
    #[derive(Debug)]
    pub struct MockVectorIndex {
        hits: Vec<SearchHit>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl MockVectorIndex {
        pub fn new(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                fail: false,
                delay: None,
            }
        }

        pub fn failing() -> Self {
            Self {
                hits: Vec::new(),
                fail: true,
                delay: None,
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl VectorIndex for MockVectorIndex {
        async fn query(
            &self,
            _embedding: &[f32],
            max_results: usize,
        ) -> Result<Vec<SearchHit>, DomainError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.fail {
                return Err(DomainError::collection("mock", "query failed"));
            }

            Ok(self.hits.iter().take(max_results).cloned().collect())
        }

        fn len(&self) -> usize {
            self.hits.len()
        }
    }

    /// Mock loader backed by a name -> hits table
    #[derive(Debug, Default)]
    pub struct MockCollectionLoader {
        collections: std::collections::HashMap<String, Vec<SearchHit>>,
        failures: std::collections::HashSet<String>,
        load_delay: Option<Duration>,
        query_delay: Option<Duration>,
        pub load_count: std::sync::atomic::AtomicUsize,
    }

    impl MockCollectionLoader {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_collection(mut self, name: &str, hits: Vec<SearchHit>) -> Self {
            self.collections.insert(name.to_string(), hits);
            self
        }

        pub fn with_failure(mut self, name: &str) -> Self {
            self.failures.insert(name.to_string());
            self
        }

        pub fn with_load_delay(mut self, delay: Duration) -> Self {
            self.load_delay = Some(delay);
            self
        }

        /// Every index built by this loader delays each query
        pub fn with_query_delay(mut self, delay: Duration) -> Self {
            self.query_delay = Some(delay);
            self
        }

        pub fn loads(&self) -> usize {
            self.load_count.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CollectionLoader for MockCollectionLoader {
        async fn load(&self, name: &str) -> Result<CollectionHandle, DomainError> {
            self.load_count
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

            if let Some(delay) = self.load_delay {
                tokio::time::sleep(delay).await;
            }

            if self.failures.contains(name) {
                return Err(DomainError::collection(name, "load failed"));
            }

            let hits = self
                .collections
                .get(name)
                .cloned()
                .ok_or_else(|| DomainError::collection(name, "unknown collection"))?;

            let mut index = MockVectorIndex::new(hits);
            if let Some(delay) = self.query_delay {
                index = index.with_delay(delay);
            }

            Ok(CollectionHandle::new(name, Arc::new(index)))
        }
    }
}
