//! Activity snapshot store configuration.

use serde::{Deserialize, Serialize};

/// Top-level activity store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStoreConfig {
    /// Store provider type: `"memory"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis-specific store configuration.
    #[serde(default)]
    pub redis: RedisStoreConfig,
}

impl Default for ActivityStoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisStoreConfig::default(),
        }
    }
}

/// Redis store backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all Cohort activity keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "cohort".to_string()
}
