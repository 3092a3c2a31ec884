//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheSettings, CollectionsSettings, EmbeddingSettings, LogFormat, LoggingConfig,
    QuerySettings, ServerConfig,
};
