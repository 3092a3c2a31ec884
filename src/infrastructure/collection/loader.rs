//! JSON file collection loader and in-memory vector index

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::collection::{
    CollectionHandle, CollectionLoader, EmbeddedDocument, VectorIndex,
};
use crate::domain::query::SearchHit;
use crate::domain::DomainError;

/// Brute-force index over one collection's embedded documents.
/// Distance is L2; lower means closer.
#[derive(Debug)]
pub struct InMemoryVectorIndex {
    collection: String,
    documents: Vec<EmbeddedDocument>,
}

impl InMemoryVectorIndex {
    pub fn new(collection: impl Into<String>, documents: Vec<EmbeddedDocument>) -> Self {
        Self {
            collection: collection.into(),
            documents,
        }
    }

    fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn query(
        &self,
        embedding: &[f32],
        max_results: usize,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let mut hits: Vec<SearchHit> = self
            .documents
            .iter()
            .map(|doc| SearchHit {
                document: doc.document.clone(),
                metadata: doc.metadata.clone(),
                distance: Self::l2_distance(embedding, &doc.embedding),
                collection: self.collection.clone(),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(max_results);

        Ok(hits)
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}

/// Loads `<data_dir>/<name>.json`: a flat array of
/// `{document, embedding, metadata}` triples written by the ingestion
/// pipeline. This store never writes collections.
#[derive(Debug)]
pub struct JsonCollectionLoader {
    data_dir: PathBuf,
    expected_dimensions: usize,
}

impl JsonCollectionLoader {
    pub fn new(data_dir: impl Into<PathBuf>, expected_dimensions: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            expected_dimensions,
        }
    }
}

#[async_trait]
impl CollectionLoader for JsonCollectionLoader {
    async fn load(&self, name: &str) -> Result<CollectionHandle, DomainError> {
        let path = self.data_dir.join(format!("{}.json", name));

        let raw = tokio::fs::read(&path).await.map_err(|e| {
            DomainError::collection(name, format!("cannot read {}: {}", path.display(), e))
        })?;

        let documents: Vec<EmbeddedDocument> = serde_json::from_slice(&raw).map_err(|e| {
            DomainError::collection(name, format!("corrupt collection file: {}", e))
        })?;

        for (position, doc) in documents.iter().enumerate() {
            if doc.embedding.len() != self.expected_dimensions {
                return Err(DomainError::collection(
                    name,
                    format!(
                        "document {} has {} dimensions, expected {}",
                        position,
                        doc.embedding.len(),
                        self.expected_dimensions
                    ),
                ));
            }
        }

        Ok(CollectionHandle::new(
            name,
            Arc::new(InMemoryVectorIndex::new(name, documents)),
        ))
    }
}
