//! In-memory share store implementation using the moka crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use dropcode_core::config::store::MemoryStoreConfig;
use dropcode_core::result::AppResult;
use dropcode_core::traits::store::ShareStore;

/// A stored value together with its absolute expiry deadline.
///
/// Share records carry individual expiry windows, so the store needs
/// per-entry TTL rather than a cache-wide one.
#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    deadline: Instant,
}

/// Per-entry expiry policy driven by the deadline inside each entry.
struct DeadlineExpiry;

impl Expiry<String, MemoryEntry> for DeadlineExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &MemoryEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.deadline.saturating_duration_since(Instant::now()))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &MemoryEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.deadline.saturating_duration_since(Instant::now()))
    }
}

/// In-memory share store using moka.
#[derive(Debug, Clone)]
pub struct MemoryShareStore {
    /// The underlying moka cache.
    cache: Cache<String, MemoryEntry>,
    /// Default TTL for entries created without an explicit window.
    default_ttl: Duration,
    /// Counters stored separately for atomic incr/decr.
    counters: Arc<dashmap::DashMap<String, AtomicI64>>,
}

impl MemoryShareStore {
    /// Create a new in-memory store from configuration.
    pub fn new(config: &MemoryStoreConfig, default_ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(DeadlineExpiry)
            .build();

        Self {
            cache,
            default_ttl: Duration::from_secs(default_ttl_seconds),
            counters: Arc::new(dashmap::DashMap::new()),
        }
    }

    /// Fetch an entry, dropping it if its deadline has passed.
    ///
    /// moka evicts expired entries lazily; the deadline check makes the
    /// expiry visible to callers immediately.
    async fn live_entry(&self, key: &str) -> Option<MemoryEntry> {
        let entry = self.cache.get(key).await?;
        if entry.deadline <= Instant::now() {
            self.cache.remove(key).await;
            self.counters.remove(key);
            return None;
        }
        Some(entry)
    }

    /// Insert a value with an absolute deadline.
    async fn insert(&self, key: &str, value: &str, deadline: Instant) {
        self.cache
            .insert(
                key.to_string(),
                MemoryEntry {
                    value: value.to_string(),
                    deadline,
                },
            )
            .await;
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.live_entry(key).await.map(|e| e.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.insert(key, value, Instant::now() + ttl).await;
        // Keep the counter map coherent when a numeric value is written.
        match value.parse::<i64>() {
            Ok(n) => {
                self.counters
                    .insert(key.to_string(), AtomicI64::new(n));
            }
            Err(_) => {
                self.counters.remove(key);
            }
        }
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        // moka has no native set-if-not-exists so we use get-then-insert.
        // Not perfectly atomic, but acceptable for in-process single-node use.
        if self.live_entry(key).await.is_some() {
            return Ok(false);
        }
        self.set(key, value, ttl).await?;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        self.counters.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.live_entry(key).await.is_some())
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        let seed = self
            .live_entry(key)
            .await
            .and_then(|e| e.value.parse::<i64>().ok())
            .unwrap_or(0);
        let entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| AtomicI64::new(seed));
        let new_val = entry.value().fetch_add(1, Ordering::SeqCst) + 1;
        drop(entry);

        let deadline = self
            .live_entry(key)
            .await
            .map(|e| e.deadline)
            .unwrap_or_else(|| Instant::now() + self.default_ttl);
        self.insert(key, &new_val.to_string(), deadline).await;
        Ok(new_val)
    }

    async fn decr(&self, key: &str) -> AppResult<i64> {
        let seed = self
            .live_entry(key)
            .await
            .and_then(|e| e.value.parse::<i64>().ok())
            .unwrap_or(0);
        let entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| AtomicI64::new(seed));
        let new_val = entry.value().fetch_sub(1, Ordering::SeqCst) - 1;
        drop(entry);

        let deadline = self
            .live_entry(key)
            .await
            .map(|e| e.deadline)
            .unwrap_or_else(|| Instant::now() + self.default_ttl);
        self.insert(key, &new_val.to_string(), deadline).await;
        Ok(new_val)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        match self.live_entry(key).await {
            Some(entry) => {
                self.insert(key, &entry.value, Instant::now() + ttl).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>> {
        Ok(self
            .live_entry(key)
            .await
            .map(|e| e.deadline.saturating_duration_since(Instant::now())))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
