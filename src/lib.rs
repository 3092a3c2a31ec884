//! Semantic search gateway
//!
//! Cached query orchestration over pre-embedded document collections:
//! - Embedding provider chain with a deterministic local fallback
//! - Lazily loaded collections with single-flight coalescing
//! - Scope-based routing with bounded concurrent fan-out
//! - Hot / persistent / embedding cache tiers

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::EmbeddingProvider;
use infrastructure::cache::{CacheConfig, CacheManager};
use infrastructure::collection::{CollectionStore, JsonCollectionLoader};
use infrastructure::embedding::{
    ChainedEmbeddingProvider, FallbackEmbeddingProvider, HttpEmbeddingConfig,
    HttpEmbeddingProvider,
};
use infrastructure::router::{QueryRouter, RouterConfig};
use infrastructure::search_service::{SearchService, SearchServiceConfig};

/// Create the application state with all services wired from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let dimensions = config.embedding.dimensions;

    let loader = Arc::new(JsonCollectionLoader::new(
        &config.collections.data_dir,
        dimensions,
    ));
    let store = Arc::new(CollectionStore::new(loader));

    let http_provider = HttpEmbeddingProvider::new(HttpEmbeddingConfig {
        base_url: config.embedding.base_url.clone(),
        model: config.embedding.model.clone(),
        dimensions,
        timeout: Duration::from_secs(config.embedding.timeout_secs),
    })?;
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(ChainedEmbeddingProvider::new(vec![
        Arc::new(http_provider),
        Arc::new(FallbackEmbeddingProvider::new(dimensions)),
    ]));

    let persistent_path = if config.cache.persistent_path.is_empty() {
        None
    } else {
        Some(PathBuf::from(&config.cache.persistent_path))
    };
    let cache = CacheManager::open(CacheConfig {
        hot_capacity: config.cache.hot_capacity,
        embedding_capacity: config.cache.embedding_capacity,
        persistent_ttl: Duration::from_secs(config.cache.persistent_ttl_hours * 3600),
        persistent_path,
        flush_every_writes: config.cache.flush_every_writes,
    })
    .await;

    let router = QueryRouter::new(
        store.clone(),
        config.collections.scopes.clone(),
        config.collections.names.clone(),
        RouterConfig {
            concurrency: config.query.concurrency,
            collection_timeout: Duration::from_secs(config.query.collection_timeout_secs),
        },
    );

    let search_service = SearchService::new(
        SearchServiceConfig {
            collections: config.collections.names.clone(),
            warmup_concurrency: config.query.concurrency,
            drain_timeout: Duration::from_secs(config.query.drain_timeout_secs),
        },
        cache,
        router,
        store,
        embedder,
    );

    Ok(AppState::new(Arc::new(search_service)))
}
