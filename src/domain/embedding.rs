//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Trait for embedding providers (HTTP backend, deterministic fallback, etc.)
///
/// `domain_hint` lets a backend pick a specialized model for a scope; most
/// providers ignore it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate an embedding for the given text
    async fn embed(&self, text: &str, domain_hint: Option<&str>)
        -> Result<Vec<f32>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the embedding dimensions this provider produces
    fn dimensions(&self) -> usize;
}
