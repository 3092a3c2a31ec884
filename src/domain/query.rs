//! Query request/result types and the cache key contract

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::DomainError;

/// Normalizes free text for cache-key purposes: trim + lowercase.
///
/// This is a contract, not an implementation detail - two requests that
/// differ only by case or surrounding whitespace must collide on the same
/// cache key.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Derives the cache key for a (text, scope) pair.
pub fn cache_key(text: &str, scope: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    hasher.update(b"|");
    hasher.update(normalize(scope).as_bytes());
    hex::encode(hasher.finalize())
}

/// A validated search request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub text: String,
    pub scope: String,
    pub max_results: usize,
}

impl QueryRequest {
    pub const DEFAULT_MAX_RESULTS: usize = 10;

    pub fn new(text: impl Into<String>, scope: impl Into<String>, max_results: usize) -> Self {
        Self {
            text: text.into(),
            scope: scope.into(),
            max_results,
        }
    }

    /// Rejects malformed requests before any I/O is attempted.
    pub fn validate(&self) -> Result<(), DomainError> {
        if normalize(&self.text).is_empty() {
            return Err(DomainError::validation("query text must not be empty"));
        }

        if self.max_results == 0 {
            return Err(DomainError::validation("max_results must be positive"));
        }

        Ok(())
    }

    /// Cache key for this request, per the normalization contract.
    pub fn cache_key(&self) -> String {
        cache_key(&self.text, &self.scope)
    }
}

/// Scalar metadata value attached to a document
///
/// A fixed-shape alternative to free-form JSON maps: collections document
/// their metadata schema once instead of callers inferring it at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// A single ranked hit; lower `distance` means a closer semantic match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub document: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
    pub distance: f32,
    pub collection: String,
}

impl SearchHit {
    pub fn new(
        document: impl Into<String>,
        distance: f32,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            metadata: BTreeMap::new(),
            distance,
            collection: collection.into(),
        }
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Where a query result was served from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    HotCache,
    PersistentCache,
    Computed,
}

/// A complete query outcome
///
/// Invariants: `hits` is sorted non-decreasing by distance and
/// `hits.len() <= request.max_results`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    pub request: QueryRequest,
    pub hits: Vec<SearchHit>,
    pub response_time_ms: f64,
    pub cache_hit: bool,
    pub source: ResultSource,
    pub timestamp: DateTime<Utc>,
}

impl QueryResult {
    pub fn computed(request: QueryRequest, hits: Vec<SearchHit>, response_time_ms: f64) -> Self {
        Self {
            request,
            hits,
            response_time_ms,
            cache_hit: false,
            source: ResultSource::Computed,
            timestamp: Utc::now(),
        }
    }

    /// Re-stamps a cached result as served from the given tier.
    pub fn as_cached(mut self, source: ResultSource, response_time_ms: f64) -> Self {
        self.cache_hit = true;
        self.source = source;
        self.response_time_ms = response_time_ms;
        self.timestamp = Utc::now();
        self
    }
}
