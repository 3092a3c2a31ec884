//! HTTP embedding provider backed by an OpenAI-compatible endpoint

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::DomainError;

/// Configuration for the HTTP embedding backend
#[derive(Debug, Clone)]
pub struct HttpEmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    /// Bounded wait for the backend call
    pub timeout: Duration,
}

impl Default for HttpEmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Primary embedding provider: POSTs to an OpenAI-compatible
/// `/v1/embeddings` endpoint with a bounded timeout.
#[derive(Debug)]
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    config: HttpEmbeddingConfig,
    url: String,
}

impl HttpEmbeddingProvider {
    pub fn new(config: HttpEmbeddingConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::provider("http", format!("Failed to build HTTP client: {}", e))
            })?;

        let url = format!(
            "{}/v1/embeddings",
            config.base_url.trim_end_matches('/')
        );

        Ok(Self {
            client,
            config,
            url,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(
        &self,
        text: &str,
        domain_hint: Option<&str>,
    ) -> Result<Vec<f32>, DomainError> {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "input": text,
        });

        if let Some(hint) = domain_hint {
            body["user"] = serde_json::json!(hint);
        }

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                DomainError::provider("http", format!("Embedding backend unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(DomainError::provider(
                "http",
                format!("Embedding backend returned {}", response.status()),
            ));
        }

        let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
            DomainError::provider("http", format!("Failed to parse embedding response: {}", e))
        })?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| DomainError::provider("http", "Empty embedding response"))?;

        if vector.len() != self.config.dimensions {
            return Err(DomainError::provider(
                "http",
                format!(
                    "Backend returned {} dimensions, expected {}",
                    vector.len(),
                    self.config.dimensions
                ),
            ));
        }

        Ok(vector)
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}
