//! Search endpoint handler

use axum::extract::State;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, SearchRequest, SearchResponse};
use crate::domain::query::QueryRequest;

/// POST /v1/search
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    info!(
        scope = %request.scope,
        max_results = request.max_results,
        "Processing search request"
    );

    let result = state
        .search_service
        .query(QueryRequest::from(request))
        .await?;

    Ok(Json(SearchResponse::from(result)))
}
