//! Scope resolution and bounded fan-out over collections

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::domain::query::SearchHit;
use crate::infrastructure::collection::CollectionStore;

/// Router tuning knobs
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Maximum sub-queries in flight per request
    pub concurrency: usize,
    /// Independent timeout per collection query
    pub collection_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            collection_timeout: Duration::from_secs(10),
        }
    }
}

/// Maps a scope to a collection set, fans out bounded concurrent queries,
/// and merges ranked hits with a partial-result policy: a failed or
/// timed-out collection contributes zero hits, never a request failure.
#[derive(Debug)]
pub struct QueryRouter {
    store: Arc<CollectionStore>,
    scopes: HashMap<String, Vec<String>>,
    all_collections: Vec<String>,
    config: RouterConfig,
}

impl QueryRouter {
    pub fn new(
        store: Arc<CollectionStore>,
        scopes: HashMap<String, Vec<String>>,
        all_collections: Vec<String>,
        config: RouterConfig,
    ) -> Self {
        Self {
            store,
            scopes,
            all_collections,
            config,
        }
    }

    /// Resolves a scope to its collection set. `"all"` and unknown scopes
    /// fall back to every known collection.
    pub fn resolve_scope(&self, scope: &str) -> Vec<String> {
        let normalized = scope.trim().to_lowercase();

        if normalized == "all" {
            return self.all_collections.clone();
        }

        match self.scopes.get(&normalized) {
            Some(collections) => collections.clone(),
            None => self.all_collections.clone(),
        }
    }

    /// Fans out one bounded-concurrency query task per resolved collection,
    /// merges the results, and ranks ascending by distance. Input order is
    /// preserved through the merge so distance ties break deterministically
    /// regardless of which sub-query finished first.
    pub async fn query(
        &self,
        embedding: &[f32],
        scope: &str,
        max_results: usize,
    ) -> Vec<SearchHit> {
        let collections = self.resolve_scope(scope);

        let per_collection: Vec<Vec<SearchHit>> = stream::iter(collections)
            .map(|name| self.query_collection(name, embedding, max_results))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut hits: Vec<SearchHit> = per_collection.into_iter().flatten().collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(max_results);
        hits
    }

    /// One sub-query with its own timeout. Errors and timeouts are logged
    /// and contribute an empty hit list.
    async fn query_collection(
        &self,
        name: String,
        embedding: &[f32],
        max_results: usize,
    ) -> Vec<SearchHit> {
        let task = async {
            let handle = self.store.get_or_load(&name).await?;
            handle.index.query(embedding, max_results).await
        };

        match tokio::time::timeout(self.config.collection_timeout, task).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(collection = %name, error = %e, "Collection query failed, dropping from merge");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    collection = %name,
                    timeout_ms = self.config.collection_timeout.as_millis() as u64,
                    "Collection query timed out, dropping from merge"
                );
                Vec::new()
            }
        }
    }
}
