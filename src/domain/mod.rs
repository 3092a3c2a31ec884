//! Domain layer: value types, traits, and the error taxonomy

pub mod collection;
pub mod embedding;
pub mod error;
pub mod metrics;
pub mod query;

pub use collection::{
    CollectionHandle, CollectionLoader, CollectionStatus, EmbeddedDocument, VectorIndex,
};
pub use embedding::EmbeddingProvider;
pub use error::DomainError;
pub use metrics::PerformanceSnapshot;
pub use query::{
    cache_key, normalize, MetadataValue, QueryRequest, QueryResult, ResultSource, SearchHit,
};
