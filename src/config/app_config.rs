use std::collections::HashMap;

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub embedding: EmbeddingSettings,
    pub query: QuerySettings,
    pub collections: CollectionsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Cache tier sizing and persistence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub hot_capacity: usize,
    pub embedding_capacity: usize,
    pub persistent_ttl_hours: u64,
    /// Empty string disables persistence
    pub persistent_path: String,
    pub flush_every_writes: usize,
}

/// Embedding backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

/// Query fan-out settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub concurrency: usize,
    pub collection_timeout_secs: u64,
    pub drain_timeout_secs: u64,
}

/// Known collections and the scope routing table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionsSettings {
    pub data_dir: String,
    pub names: Vec<String>,
    /// scope -> collection subset; unlisted scopes search everything
    pub scopes: HashMap<String, Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            hot_capacity: 1000,
            embedding_capacity: 5000,
            persistent_ttl_hours: 24,
            persistent_path: "cache/queries.json".to_string(),
            flush_every_writes: 10,
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout_secs: 30,
        }
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            collection_timeout_secs: 10,
            drain_timeout_secs: 10,
        }
    }
}

impl Default for CollectionsSettings {
    fn default() -> Self {
        let mut scopes = HashMap::new();
        scopes.insert("hal".to_string(), vec!["stm32_hal".to_string()]);
        scopes.insert("motor".to_string(), vec!["motor_control".to_string()]);

        Self {
            data_dir: "data".to_string(),
            names: vec!["stm32_hal".to_string(), "motor_control".to_string()],
            scopes,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_complete() {
        let config = AppConfig::default();

        assert_eq!(config.cache.hot_capacity, 1000);
        assert_eq!(config.cache.embedding_capacity, 5000);
        assert_eq!(config.cache.persistent_ttl_hours, 24);
        assert_eq!(config.query.concurrency, 4);
        assert_eq!(config.embedding.timeout_secs, 30);
    }

    #[test]
    fn test_default_scope_table_routes_hal() {
        let config = AppConfig::default();
        assert_eq!(
            config.collections.scopes["hal"],
            vec!["stm32_hal".to_string()]
        );
    }
}
