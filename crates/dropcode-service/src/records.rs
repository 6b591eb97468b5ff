//! Typed access to share records and their counters.
//!
//! Every store key the application touches goes through this module, so
//! the record/slots/downloads key triple always moves together.

use std::time::Duration;

use tracing::debug;

use dropcode_core::result::AppResult;
use dropcode_core::traits::store::ShareStore;
use dropcode_core::types::ShareCode;
use dropcode_entity::share::ShareRecord;
use dropcode_store::{StoreManager, keys};

/// Repository for share records and their live counters.
#[derive(Debug, Clone)]
pub struct ShareRecords {
    store: StoreManager,
}

impl ShareRecords {
    /// Create a repository over the given store.
    pub fn new(store: StoreManager) -> Self {
        Self { store }
    }

    /// Load a share record. Returns `None` when the code is unknown or
    /// the record's TTL has elapsed.
    pub async fn load(&self, code: &ShareCode) -> AppResult<Option<ShareRecord>> {
        self.store.get_json(&keys::share_record(code)).await
    }

    /// Claim a code by registering its record, failing if the code is
    /// already taken. Returns `true` when the claim succeeded.
    pub async fn register(&self, record: &ShareRecord, ttl: Duration) -> AppResult<bool> {
        let json = serde_json::to_string(record)?;
        self.store
            .set_nx(&keys::share_record(&record.code), &json, ttl)
            .await
    }

    /// Overwrite an existing record, keeping the given TTL.
    pub async fn save(&self, record: &ShareRecord, ttl: Duration) -> AppResult<()> {
        self.store
            .set_json(&keys::share_record(&record.code), record, ttl)
            .await
    }

    /// Remaining TTL of the record key.
    pub async fn ttl(&self, code: &ShareCode) -> AppResult<Option<Duration>> {
        self.store.ttl(&keys::share_record(code)).await
    }

    /// Initialize or overwrite the remaining-slots counter.
    pub async fn set_slots(&self, code: &ShareCode, slots: u32, ttl: Duration) -> AppResult<()> {
        self.store
            .set(&keys::share_slots(code), &slots.to_string(), ttl)
            .await
    }

    /// Read the remaining-slots counter. `None` when the key is gone.
    pub async fn slots_left(&self, code: &ShareCode) -> AppResult<Option<u32>> {
        let value = self.store.get(&keys::share_slots(code)).await?;
        Ok(value.and_then(|v| v.parse::<i64>().ok()).map(|n| n.max(0) as u32))
    }

    /// Atomically consume one budget slot. Returns the remaining count,
    /// which is negative when the budget was already spent.
    pub async fn consume_slot(&self, code: &ShareCode) -> AppResult<i64> {
        self.store.decr(&keys::share_slots(code)).await
    }

    /// Hand back a slot taken by an overdrawn decrement.
    pub async fn release_slot(&self, code: &ShareCode) -> AppResult<i64> {
        self.store.incr(&keys::share_slots(code)).await
    }

    /// Initialize the total-downloads counter.
    pub async fn set_downloads(&self, code: &ShareCode, count: u64, ttl: Duration) -> AppResult<()> {
        self.store
            .set(&keys::share_downloads(code), &count.to_string(), ttl)
            .await
    }

    /// Read the total-downloads counter.
    pub async fn downloads(&self, code: &ShareCode) -> AppResult<u64> {
        let value = self.store.get(&keys::share_downloads(code)).await?;
        Ok(value
            .and_then(|v| v.parse::<i64>().ok())
            .map(|n| n.max(0) as u64)
            .unwrap_or(0))
    }

    /// Count a served download. Returns the new total.
    pub async fn count_download(&self, code: &ShareCode) -> AppResult<u64> {
        let total = self.store.incr(&keys::share_downloads(code)).await?;
        Ok(total.max(0) as u64)
    }

    /// Re-set the TTL on the record and both counters.
    pub async fn refresh_ttl(&self, code: &ShareCode, ttl: Duration) -> AppResult<()> {
        self.store.expire(&keys::share_record(code), ttl).await?;
        self.store.expire(&keys::share_slots(code), ttl).await?;
        self.store.expire(&keys::share_downloads(code), ttl).await?;
        Ok(())
    }

    /// Whether a record exists for the code.
    pub async fn exists(&self, code: &ShareCode) -> AppResult<bool> {
        self.store.exists(&keys::share_record(code)).await
    }

    /// Remove the record and both counters.
    pub async fn destroy(&self, code: &ShareCode) -> AppResult<()> {
        self.store.delete(&keys::share_record(code)).await?;
        self.store.delete(&keys::share_slots(code)).await?;
        self.store.delete(&keys::share_downloads(code)).await?;
        debug!(code = %code, "Destroyed share record and counters");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use dropcode_core::config::store::MemoryStoreConfig;
    use dropcode_store::memory::MemoryShareStore;

    fn repo() -> ShareRecords {
        let store = MemoryShareStore::new(&MemoryStoreConfig::default(), 600);
        ShareRecords::new(StoreManager::from_provider(Arc::new(store)))
    }

    fn record(code: &str) -> ShareRecord {
        let now = Utc::now();
        ShareRecord {
            code: ShareCode::parse(code).unwrap(),
            files: vec![],
            display_name: "empty".to_string(),
            total_size_bytes: 0,
            created_at: now,
            expires_at: now + chrono::Duration::minutes(10),
            expiry_minutes: 10,
            max_downloads: Some(5),
            bundled: false,
        }
    }

    #[tokio::test]
    async fn test_register_claims_code_once() {
        let repo = repo();
        let rec = record("AB2CD");
        let ttl = Duration::from_secs(600);

        assert!(repo.register(&rec, ttl).await.unwrap());
        assert!(!repo.register(&rec, ttl).await.unwrap());

        let loaded = repo.load(&rec.code).await.unwrap().unwrap();
        assert_eq!(loaded.display_name, "empty");
    }

    #[tokio::test]
    async fn test_slot_consumption_and_release() {
        let repo = repo();
        let code = ShareCode::parse("AB2CD").unwrap();
        let ttl = Duration::from_secs(600);

        repo.set_slots(&code, 2, ttl).await.unwrap();
        assert_eq!(repo.consume_slot(&code).await.unwrap(), 1);
        assert_eq!(repo.consume_slot(&code).await.unwrap(), 0);
        assert_eq!(repo.consume_slot(&code).await.unwrap(), -1);

        repo.release_slot(&code).await.unwrap();
        assert_eq!(repo.slots_left(&code).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_destroy_removes_all_keys() {
        let repo = repo();
        let rec = record("XYZ23");
        let ttl = Duration::from_secs(600);

        repo.register(&rec, ttl).await.unwrap();
        repo.set_slots(&rec.code, 5, ttl).await.unwrap();
        repo.set_downloads(&rec.code, 0, ttl).await.unwrap();

        repo.destroy(&rec.code).await.unwrap();
        assert!(repo.load(&rec.code).await.unwrap().is_none());
        assert!(repo.slots_left(&rec.code).await.unwrap().is_none());
        assert_eq!(repo.downloads(&rec.code).await.unwrap(), 0);
    }
}
