//! Multi-tier result and embedding caching

mod manager;
mod persistent;

pub use manager::{CacheConfig, CacheManager};
pub use persistent::{CacheEntry, PersistentTier};
