//! Ordered embedding provider chain

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::DomainError;

/// Tries each provider in order until one returns a vector.
///
/// An explicit strategy list instead of exception-driven fallback: when the
/// chain ends with `FallbackEmbeddingProvider` the caller never sees an
/// error, only a warning in the logs.
#[derive(Debug)]
pub struct ChainedEmbeddingProvider {
    providers: Vec<Arc<dyn EmbeddingProvider>>,
}

impl ChainedEmbeddingProvider {
    pub fn new(providers: Vec<Arc<dyn EmbeddingProvider>>) -> Self {
        assert!(!providers.is_empty(), "provider chain must not be empty");
        Self { providers }
    }
}

#[async_trait]
impl EmbeddingProvider for ChainedEmbeddingProvider {
    async fn embed(
        &self,
        text: &str,
        domain_hint: Option<&str>,
    ) -> Result<Vec<f32>, DomainError> {
        let mut last_error = None;

        for (position, provider) in self.providers.iter().enumerate() {
            match provider.embed(text, domain_hint).await {
                Ok(vector) => {
                    if position > 0 {
                        warn!(
                            provider = provider.provider_name(),
                            "Primary embedding backend unavailable, using fallback"
                        );
                    }
                    return Ok(vector);
                }
                Err(e) => {
                    warn!(
                        provider = provider.provider_name(),
                        error = %e,
                        "Embedding provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DomainError::provider("chain", "no embedding provider configured")
        }))
    }

    fn provider_name(&self) -> &'static str {
        "chain"
    }

    fn dimensions(&self) -> usize {
        self.providers[0].dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::mock::MockEmbeddingProvider;
    use crate::infrastructure::embedding::FallbackEmbeddingProvider;

    #[tokio::test]
    async fn test_primary_wins_when_healthy() {
        let chain = ChainedEmbeddingProvider::new(vec![
            Arc::new(MockEmbeddingProvider::new("primary", 64)),
            Arc::new(FallbackEmbeddingProvider::new(64)),
        ]);

        let primary = MockEmbeddingProvider::new("primary", 64);
        let expected = primary.embed("gpio init", None).await.unwrap();
        let actual = chain.embed("gpio init", None).await.unwrap();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_errors() {
        let chain = ChainedEmbeddingProvider::new(vec![
            Arc::new(MockEmbeddingProvider::new("primary", 64).with_error("backend down")),
            Arc::new(FallbackEmbeddingProvider::new(64)),
        ]);

        let fallback = FallbackEmbeddingProvider::new(64);
        let expected = fallback.embed("gpio init", None).await.unwrap();
        let actual = chain.embed("gpio init", None).await.unwrap();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_error_surfaces_only_when_all_fail() {
        let chain = ChainedEmbeddingProvider::new(vec![Arc::new(
            MockEmbeddingProvider::new("primary", 64).with_error("backend down"),
        )]);

        assert!(chain.embed("gpio init", None).await.is_err());
    }
}
