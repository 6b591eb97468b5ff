//! Key-value store configuration.

use serde::{Deserialize, Serialize};

/// Top-level store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store provider type: `"memory"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Default TTL for entries in seconds (used when a share carries no
    /// explicit expiry).
    #[serde(default = "default_ttl")]
    pub default_ttl_seconds: u64,
    /// Redis-specific store configuration.
    #[serde(default)]
    pub redis: RedisStoreConfig,
    /// In-memory store configuration.
    #[serde(default)]
    pub memory: MemoryStoreConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            default_ttl_seconds: default_ttl(),
            redis: RedisStoreConfig::default(),
            memory: MemoryStoreConfig::default(),
        }
    }
}

/// Redis store backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all DropCode keys.
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

/// In-memory store backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStoreConfig {
    /// Maximum number of entries in the store.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_ttl() -> u64 {
    600
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "dropcode:".to_string()
}

fn default_max_capacity() -> u64 {
    10000
}
