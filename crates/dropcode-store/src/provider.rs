//! Store manager that dispatches to the configured backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use dropcode_core::config::store::StoreConfig;
use dropcode_core::error::AppError;
use dropcode_core::result::AppResult;
use dropcode_core::traits::store::ShareStore;

/// Store manager that wraps the configured share store backend.
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner store backend.
    inner: Arc<dyn ShareStore>,
}

impl StoreManager {
    /// Create a new store manager from configuration.
    pub async fn new(config: &StoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn ShareStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis share store");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisShareStore::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory share store");
                Arc::new(crate::memory::MemoryShareStore::new(
                    &config.memory,
                    config.default_ttl_seconds,
                ))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a store manager from an existing backend (for testing).
    pub fn from_provider(provider: Arc<dyn ShareStore>) -> Self {
        Self { inner: provider }
    }
}

#[async_trait]
impl ShareStore for StoreManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.set_nx(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        self.inner.incr(key).await
    }

    async fn decr(&self, key: &str) -> AppResult<i64> {
        self.inner.decr(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.expire(key, ttl).await
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>> {
        self.inner.ttl(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_provider_selected_by_default() {
        let config = StoreConfig::default();
        let manager = StoreManager::new(&config).await.unwrap();
        assert!(manager.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let config = StoreConfig {
            provider: "etcd".to_string(),
            ..StoreConfig::default()
        };
        assert!(StoreManager::new(&config).await.is_err());
    }
}
