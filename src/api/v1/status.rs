//! Service status endpoint handler

use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::search_service::ServiceStatus;

/// GET /v1/status
pub async fn status(State(state): State<AppState>) -> Result<Json<ServiceStatus>, ApiError> {
    Ok(Json(state.search_service.status().await))
}
