//! Infrastructure layer: concrete caches, stores, providers, and wiring

pub mod cache;
pub mod collection;
pub mod embedding;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod search_service;
