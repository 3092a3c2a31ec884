//! Wire types shared by the API handlers

pub mod error;
pub mod json;
pub mod search;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use search::{SearchRequest, SearchResponse};
