//! Wire types for the search endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::query::{QueryRequest, QueryResult, ResultSource, SearchHit};

/// POST /v1/search request body
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Defaults to searching every collection
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_scope() -> String {
    "all".to_string()
}

fn default_max_results() -> usize {
    QueryRequest::DEFAULT_MAX_RESULTS
}

impl From<SearchRequest> for QueryRequest {
    fn from(request: SearchRequest) -> Self {
        QueryRequest::new(request.query, request.scope, request.max_results)
    }
}

/// POST /v1/search response body
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub scope: String,
    pub results: Vec<SearchHit>,
    pub response_time_ms: f64,
    pub cache_hit: bool,
    pub source: ResultSource,
    pub timestamp: DateTime<Utc>,
}

impl From<QueryResult> for SearchResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            query: result.request.text,
            scope: result.request.scope,
            results: result.hits,
            response_time_ms: result.response_time_ms,
            cache_hit: result.cache_hit,
            source: result.source,
            timestamp: result.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: SearchRequest = serde_json::from_str(r#"{"query": "gpio init"}"#).unwrap();

        assert_eq!(request.scope, "all");
        assert_eq!(request.max_results, QueryRequest::DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn test_request_explicit_fields() {
        let request: SearchRequest = serde_json::from_str(
            r#"{"query": "gpio init", "scope": "hal", "max_results": 3}"#,
        )
        .unwrap();

        assert_eq!(request.scope, "hal");
        assert_eq!(request.max_results, 3);
    }

    #[test]
    fn test_response_from_result() {
        let result = QueryResult::computed(
            QueryRequest::new("gpio init", "hal", 3),
            vec![SearchHit::new("doc", 0.1, "stm32_hal")],
            4.2,
        );

        let response = SearchResponse::from(result);
        assert_eq!(response.query, "gpio init");
        assert_eq!(response.results.len(), 1);
        assert!(!response.cache_hit);
        assert_eq!(response.source, ResultSource::Computed);
    }
}
