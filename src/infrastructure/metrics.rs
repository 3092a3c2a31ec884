//! Online performance accounting

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::domain::metrics::PerformanceSnapshot;
use crate::domain::query::ResultSource;

#[derive(Debug, Default)]
struct Counters {
    query_count: u64,
    avg_response_time_ms: f64,
    hot_hits: u64,
    persistent_hits: u64,
    computed: u64,
}

/// O(1)-memory recorder: incremental running mean, per-tier hit counters,
/// snapshot derived on read. Recording never awaits.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    counters: Mutex<Counters>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, response_time_ms: f64, source: ResultSource) {
        let mut counters = self.counters.lock().expect("metrics lock poisoned");

        counters.query_count += 1;
        // Welford-style incremental mean; no historical buffer.
        counters.avg_response_time_ms +=
            (response_time_ms - counters.avg_response_time_ms) / counters.query_count as f64;

        match source {
            ResultSource::HotCache => counters.hot_hits += 1,
            ResultSource::PersistentCache => counters.persistent_hits += 1,
            ResultSource::Computed => counters.computed += 1,
        }
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        let counters = self.counters.lock().expect("metrics lock poisoned");

        if counters.query_count == 0 {
            return PerformanceSnapshot::empty();
        }

        let mut hits_per_tier = BTreeMap::new();
        hits_per_tier.insert("hot".to_string(), counters.hot_hits);
        hits_per_tier.insert("persistent".to_string(), counters.persistent_hits);
        hits_per_tier.insert("computed".to_string(), counters.computed);

        let cache_hits = counters.hot_hits + counters.persistent_hits;

        PerformanceSnapshot {
            query_count: counters.query_count,
            avg_response_time_ms: counters.avg_response_time_ms,
            hits_per_tier,
            cache_hit_rate: cache_hits as f64 / counters.query_count as f64,
        }
    }
}
