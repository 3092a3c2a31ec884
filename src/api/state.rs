//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::search_service::SearchService;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub search_service: Arc<SearchService>,
}

impl AppState {
    pub fn new(search_service: Arc<SearchService>) -> Self {
        Self { search_service }
    }
}
