//! Derived performance snapshot types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Point-in-time performance accounting; recomputed on read, never persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSnapshot {
    pub query_count: u64,
    pub avg_response_time_ms: f64,
    pub hits_per_tier: BTreeMap<String, u64>,
    pub cache_hit_rate: f64,
}

impl PerformanceSnapshot {
    pub fn empty() -> Self {
        Self {
            query_count: 0,
            avg_response_time_ms: 0.0,
            hits_per_tier: BTreeMap::new(),
            cache_hit_rate: 0.0,
        }
    }
}
