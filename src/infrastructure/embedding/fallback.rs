//! Deterministic fallback embedding provider

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::query::normalize;
use crate::domain::DomainError;

/// Last-resort provider: a pseudo-random vector seeded from a hash of the
/// normalized text. The same text always maps to the same vector, so cache
/// keys and tests stay reproducible without a live backend. Never fails.
#[derive(Debug)]
pub struct FallbackEmbeddingProvider {
    dimensions: usize,
}

impl FallbackEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn seed_for(text: &str) -> u64 {
        let digest = Sha256::digest(normalize(text).as_bytes());
        u64::from_le_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
    }
}

#[async_trait]
impl EmbeddingProvider for FallbackEmbeddingProvider {
    async fn embed(
        &self,
        text: &str,
        _domain_hint: Option<&str>,
    ) -> Result<Vec<f32>, DomainError> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(Self::seed_for(text));
        Ok((0..self.dimensions).map(|_| rng.gen_range(-1.0..1.0)).collect())
    }

    fn provider_name(&self) -> &'static str {
        "fallback"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
