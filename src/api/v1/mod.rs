//! v1 API endpoints

pub mod search;
pub mod status;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/search", post(search::search))
        .route("/status", get(status::status))
}
