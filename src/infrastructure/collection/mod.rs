//! Collection loading and memoization

mod loader;
mod store;

pub use loader::{InMemoryVectorIndex, JsonCollectionLoader};
pub use store::CollectionStore;
