//! Search service: lifecycle state machine and the query path

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::collection::CollectionStatus;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::metrics::PerformanceSnapshot;
use crate::domain::query::{QueryRequest, QueryResult, ResultSource};
use crate::domain::DomainError;
use crate::infrastructure::cache::CacheManager;
use crate::infrastructure::collection::CollectionStore;
use crate::infrastructure::metrics::MetricsRecorder;
use crate::infrastructure::router::QueryRouter;

/// Linear service lifecycle; no transition ever goes backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Unstarted,
    Warming,
    Ready,
    Stopping,
    Stopped,
}

/// Service-level tuning knobs
#[derive(Debug, Clone)]
pub struct SearchServiceConfig {
    /// All known collection names, warmed on start
    pub collections: Vec<String>,
    pub warmup_concurrency: usize,
    /// Bound on waiting for in-flight queries during shutdown
    pub drain_timeout: Duration,
}

impl Default for SearchServiceConfig {
    fn default() -> Self {
        Self {
            collections: Vec::new(),
            warmup_concurrency: 4,
            drain_timeout: Duration::from_secs(10),
        }
    }
}

/// Service status for the status surface
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub state: ServiceState,
    pub performance: PerformanceSnapshot,
    pub loaded_collections: Vec<String>,
    pub collection_status: BTreeMap<String, CollectionStatus>,
    pub hot_cache_entries: usize,
    pub persistent_cache_entries: usize,
    pub uptime_secs: u64,
}

/// Orchestrates warmup, the cached query lifecycle, and shutdown.
///
/// All shared state (caches, collection store) is owned here and handed to
/// subcomponents by reference; there are no ambient globals.
pub struct SearchService {
    state: RwLock<ServiceState>,
    config: SearchServiceConfig,
    cache: CacheManager,
    router: QueryRouter,
    store: Arc<CollectionStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    metrics: MetricsRecorder,
    in_flight: AtomicUsize,
    started_at: RwLock<Option<Instant>>,
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("state", &self.state())
            .field("collections", &self.config.collections)
            .finish()
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SearchService {
    pub fn new(
        config: SearchServiceConfig,
        cache: CacheManager,
        router: QueryRouter,
        store: Arc<CollectionStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            state: RwLock::new(ServiceState::Unstarted),
            config,
            cache,
            router,
            store,
            embedder,
            metrics: MetricsRecorder::new(),
            in_flight: AtomicUsize::new(0),
            started_at: RwLock::new(None),
        }
    }

    pub fn state(&self) -> ServiceState {
        *self.state.read().expect("state lock poisoned")
    }

    fn transition(&self, from: ServiceState, to: ServiceState) -> Result<(), DomainError> {
        let mut state = self.state.write().expect("state lock poisoned");
        if *state != from {
            return Err(DomainError::unavailable(format!(
                "cannot transition {:?} -> {:?}, current state is {:?}",
                from, to, *state
            )));
        }
        *state = to;
        Ok(())
    }

    /// Warms every known collection with bounded concurrency. A collection
    /// that fails to load is unavailable, not a startup failure.
    pub async fn start(&self) -> Result<(), DomainError> {
        self.transition(ServiceState::Unstarted, ServiceState::Warming)?;
        *self.started_at.write().expect("started_at lock poisoned") = Some(Instant::now());
        info!(collections = self.config.collections.len(), "Warming collections");

        let outcomes: Vec<bool> = stream::iter(self.config.collections.clone())
            .map(|name| {
                let store = self.store.clone();
                async move { store.get_or_load(&name).await.is_ok() }
            })
            .buffer_unordered(self.config.warmup_concurrency.max(1))
            .collect()
            .await;

        let loaded = outcomes.iter().filter(|ok| **ok).count();
        let failed = outcomes.len() - loaded;

        if failed > 0 {
            warn!(loaded, failed, "Warmup finished with unavailable collections");
        } else {
            info!(loaded, "Warmup complete");
        }

        self.transition(ServiceState::Warming, ServiceState::Ready)
    }

    /// The query lifecycle: validate, cache read, embed, fan out, cache
    /// write-through, record metrics.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResult, DomainError> {
        // Counted before the state read: once stop() observes Stopping, every
        // admitted query is already visible to the drain loop. The guard
        // decrements on every exit path, including the rejection below.
        let _guard = InFlightGuard::enter(&self.in_flight);

        if self.state() != ServiceState::Ready {
            return Err(DomainError::unavailable("service is not ready"));
        }

        request.validate()?;

        let started = Instant::now();
        let key = request.cache_key();

        if let Some((cached, source)) = self.cache.get(&key).await {
            let elapsed_ms = elapsed_ms(started);
            self.metrics.record(elapsed_ms, source);
            return Ok(cached.as_cached(source, elapsed_ms));
        }

        let embedding = match self.cache.get_embedding(&request.text).await {
            Some(embedding) => embedding,
            None => {
                let embedding = self
                    .embedder
                    .embed(&request.text, Some(&request.scope))
                    .await?;
                self.cache
                    .put_embedding(&request.text, embedding.clone())
                    .await;
                embedding
            }
        };

        let hits = self
            .router
            .query(&embedding, &request.scope, request.max_results)
            .await;

        let elapsed_ms = elapsed_ms(started);
        let result = QueryResult::computed(request, hits, elapsed_ms);

        self.cache.put(&key, result.clone()).await;
        self.metrics.record(elapsed_ms, ResultSource::Computed);

        Ok(result)
    }

    /// Stops accepting queries, drains in-flight requests up to the drain
    /// timeout, flushes the persistent tier, then terminates.
    pub async fn stop(&self) -> Result<(), DomainError> {
        self.transition(ServiceState::Ready, ServiceState::Stopping)?;
        info!("Stopping search service");

        let deadline = Instant::now() + self.config.drain_timeout;
        while self.in_flight.load(Ordering::SeqCst) > 0 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let remaining = self.in_flight.load(Ordering::SeqCst);
        if remaining > 0 {
            warn!(remaining, "Drain timeout expired with queries still in flight");
        }

        if let Err(e) = self.cache.flush().await {
            warn!(error = %e, "Final cache flush failed");
        }

        self.transition(ServiceState::Stopping, ServiceState::Stopped)?;
        info!("Search service stopped");
        Ok(())
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        self.metrics.snapshot()
    }

    pub async fn status(&self) -> ServiceStatus {
        let uptime_secs = self
            .started_at
            .read()
            .expect("started_at lock poisoned")
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0);

        ServiceStatus {
            state: self.state(),
            performance: self.metrics.snapshot(),
            loaded_collections: self.store.loaded_collections().await,
            collection_status: self.store.statuses(),
            hot_cache_entries: self.cache.hot_len().await,
            persistent_cache_entries: self.cache.persistent_len().await,
            uptime_secs,
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collection::mock::MockCollectionLoader;
    use crate::domain::embedding::mock::MockEmbeddingProvider;
    use crate::domain::query::SearchHit;
    use crate::infrastructure::cache::CacheConfig;
    use crate::infrastructure::router::RouterConfig;
    use std::collections::HashMap;

    async fn service_with(loader: MockCollectionLoader, collections: &[&str]) -> SearchService {
        let store = Arc::new(CollectionStore::new(Arc::new(loader)));
        let mut scopes = HashMap::new();
        scopes.insert("hal".to_string(), vec!["stm32_hal".to_string()]);
        scopes.insert("motor".to_string(), vec!["motor_control".to_string()]);

        let all: Vec<String> = collections.iter().map(|s| s.to_string()).collect();
        let router = QueryRouter::new(store.clone(), scopes, all.clone(), RouterConfig::default());
        let cache = CacheManager::open(CacheConfig::default()).await;

        SearchService::new(
            SearchServiceConfig {
                collections: all,
                ..SearchServiceConfig::default()
            },
            cache,
            router,
            store,
            Arc::new(MockEmbeddingProvider::new("mock", 8)),
        )
    }

    fn loader() -> MockCollectionLoader {
        MockCollectionLoader::new()
            .with_collection(
                "stm32_hal",
                vec![
                    SearchHit::new("gpio doc", 0.1, "stm32_hal"),
                    SearchHit::new("uart doc", 0.4, "stm32_hal"),
                    SearchHit::new("spi doc", 0.6, "stm32_hal"),
                    SearchHit::new("i2c doc", 0.8, "stm32_hal"),
                ],
            )
            .with_collection(
                "motor_control",
                vec![SearchHit::new("pid doc", 0.2, "motor_control")],
            )
    }

    #[tokio::test]
    async fn test_start_reaches_ready_and_warms_collections() {
        let service = service_with(loader(), &["stm32_hal", "motor_control"]).await;
        assert_eq!(service.state(), ServiceState::Unstarted);

        service.start().await.unwrap();

        assert_eq!(service.state(), ServiceState::Ready);
        let status = service.status().await;
        assert_eq!(
            status.loaded_collections,
            vec!["motor_control".to_string(), "stm32_hal".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_collection_does_not_fail_startup() {
        let service = service_with(
            loader().with_failure("sensor_fusion"),
            &["stm32_hal", "motor_control", "sensor_fusion"],
        )
        .await;

        service.start().await.unwrap();

        assert_eq!(service.state(), ServiceState::Ready);
        let status = service.status().await;
        assert_eq!(
            status.collection_status["sensor_fusion"],
            CollectionStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_query_before_start_is_rejected() {
        let service = service_with(loader(), &["stm32_hal"]).await;

        let result = service.query(QueryRequest::new("gpio init", "hal", 3)).await;
        assert!(matches!(result, Err(DomainError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_malformed_request_is_rejected_synchronously() {
        let service = service_with(loader(), &["stm32_hal"]).await;
        service.start().await.unwrap();

        let empty = service.query(QueryRequest::new("   ", "hal", 3)).await;
        assert!(matches!(empty, Err(DomainError::Validation { .. })));

        let zero = service.query(QueryRequest::new("gpio init", "hal", 0)).await;
        assert!(matches!(zero, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_first_query_is_computed_sorted_and_truncated() {
        let service = service_with(loader(), &["stm32_hal", "motor_control"]).await;
        service.start().await.unwrap();

        let result = service
            .query(QueryRequest::new("GPIO init", "hal", 3))
            .await
            .unwrap();

        assert_eq!(result.source, ResultSource::Computed);
        assert!(!result.cache_hit);
        assert!(result.hits.len() <= 3);
        assert!(result
            .hits
            .windows(2)
            .all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_repeated_query_hits_hot_cache_with_identical_hits() {
        let service = service_with(loader(), &["stm32_hal", "motor_control"]).await;
        service.start().await.unwrap();

        let first = service
            .query(QueryRequest::new("GPIO init", "hal", 3))
            .await
            .unwrap();
        let second = service
            .query(QueryRequest::new("GPIO init", "hal", 3))
            .await
            .unwrap();

        assert!(second.cache_hit);
        assert_eq!(second.source, ResultSource::HotCache);
        assert_eq!(first.hits, second.hits);
    }

    #[tokio::test]
    async fn test_cache_key_normalization_collides_requests() {
        let service = service_with(loader(), &["stm32_hal", "motor_control"]).await;
        service.start().await.unwrap();

        let _ = service
            .query(QueryRequest::new("  GPIO Init ", "HAL", 3))
            .await
            .unwrap();
        let second = service
            .query(QueryRequest::new("gpio init", "hal", 3))
            .await
            .unwrap();

        assert!(second.cache_hit);
    }

    #[tokio::test]
    async fn test_unknown_scope_searches_all_collections() {
        let service = service_with(loader(), &["stm32_hal", "motor_control"]).await;
        service.start().await.unwrap();

        let result = service
            .query(QueryRequest::new("gpio init", "unknown_scope", 10))
            .await
            .unwrap();

        let collections: std::collections::HashSet<_> =
            result.hits.iter().map(|h| h.collection.as_str()).collect();
        assert!(collections.contains("stm32_hal"));
        assert!(collections.contains("motor_control"));
    }

    #[tokio::test]
    async fn test_metrics_reflect_hits_and_misses() {
        let service = service_with(loader(), &["stm32_hal", "motor_control"]).await;
        service.start().await.unwrap();

        for _ in 0..2 {
            service
                .query(QueryRequest::new("gpio init", "hal", 3))
                .await
                .unwrap();
        }

        let snapshot = service.snapshot();
        assert_eq!(snapshot.query_count, 2);
        assert_eq!(snapshot.hits_per_tier["computed"], 1);
        assert_eq!(snapshot.hits_per_tier["hot"], 1);
        assert!((snapshot.cache_hit_rate - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_stop_reaches_stopped_and_rejects_further_queries() {
        let service = service_with(loader(), &["stm32_hal"]).await;
        service.start().await.unwrap();

        service.stop().await.unwrap();
        assert_eq!(service.state(), ServiceState::Stopped);

        let result = service.query(QueryRequest::new("gpio init", "hal", 3)).await;
        assert!(matches!(result, Err(DomainError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_rejected_query_leaves_no_in_flight_count() {
        let service = service_with(loader(), &["stm32_hal"]).await;

        // Rejected for not being ready; the counter must still come back to zero
        let result = service.query(QueryRequest::new("gpio init", "hal", 3)).await;
        assert!(result.is_err());
        assert_eq!(service.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_drains_slow_in_flight_query() {
        let service = Arc::new(
            service_with(
                loader().with_query_delay(Duration::from_millis(100)),
                &["stm32_hal", "motor_control"],
            )
            .await,
        );
        service.start().await.unwrap();

        let task = {
            let service = service.clone();
            tokio::spawn(
                async move { service.query(QueryRequest::new("gpio init", "hal", 3)).await },
            )
        };
        // Let the query get admitted and into the fan-out before stopping
        tokio::time::sleep(Duration::from_millis(20)).await;

        service.stop().await.unwrap();

        assert_eq!(service.state(), ServiceState::Stopped);
        assert!(task.await.unwrap().is_ok());
        assert_eq!(service.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lifecycle_is_linear() {
        let service = service_with(loader(), &["stm32_hal"]).await;
        service.start().await.unwrap();

        // A second start is a state error
        assert!(service.start().await.is_err());

        service.stop().await.unwrap();
        // A second stop is too
        assert!(service.stop().await.is_err());
    }
}
