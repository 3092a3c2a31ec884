//! Embedding provider implementations

mod chain;
mod fallback;
mod http;

pub use chain::ChainedEmbeddingProvider;
pub use fallback::FallbackEmbeddingProvider;
pub use http::{HttpEmbeddingConfig, HttpEmbeddingProvider};
