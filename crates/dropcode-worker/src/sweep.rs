//! The cleanup sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use dropcode_core::error::ErrorKind;
use dropcode_core::events::{EventBus, ShareEvent};
use dropcode_core::result::AppResult;
use dropcode_core::traits::storage::StorageProvider;
use dropcode_service::ShareRecords;
use dropcode_storage::layout;

/// What one sweep pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Payload directories whose share record no longer exists.
    pub orphan_dirs_removed: u64,
    /// Stale entries removed from the temp directory.
    pub temp_entries_removed: u64,
}

/// Removes on-disk leftovers of shares the store has already forgotten.
///
/// Key-value backends cannot enumerate live codes cheaply, so the sweep
/// walks the payload tree instead: every directory name is a code, and a
/// code whose record is gone (expired or exhausted) marks the directory
/// as garbage.
#[derive(Debug, Clone)]
pub struct SweepService {
    records: ShareRecords,
    storage: Arc<dyn StorageProvider>,
    events: EventBus,
    temp_max_age: Duration,
}

impl SweepService {
    /// Create a sweep service. `temp_max_age` is how long temp artifacts
    /// may linger before being collected.
    pub fn new(
        records: ShareRecords,
        storage: Arc<dyn StorageProvider>,
        events: EventBus,
        temp_max_age: Duration,
    ) -> Self {
        Self {
            records,
            storage,
            events,
            temp_max_age,
        }
    }

    /// Run one full sweep pass.
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        let report = SweepReport {
            orphan_dirs_removed: self.sweep_orphan_payloads().await?,
            temp_entries_removed: self.sweep_temp().await?,
        };
        info!(
            orphan_dirs = report.orphan_dirs_removed,
            temp_entries = report.temp_entries_removed,
            "Cleanup sweep finished"
        );
        Ok(report)
    }

    async fn sweep_orphan_payloads(&self) -> AppResult<u64> {
        let entries = match self.storage.list(layout::SHARES_DIR).await {
            Ok(entries) => entries,
            // Nothing uploaded yet.
            Err(e) if e.kind == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        for entry in entries {
            if !entry.is_directory {
                continue;
            }
            let dir_name = entry
                .path
                .rsplit('/')
                .next()
                .unwrap_or(entry.path.as_str());

            let code = match layout::code_for_dir(dir_name) {
                // Directory name is not a share code; nothing we own
                // could have put it there.
                None => {
                    warn!(path = %entry.path, "Skipping unrecognized entry in payload tree");
                    continue;
                }
                Some(code) => code,
            };
            if self.records.exists(&code).await? {
                continue;
            }

            debug!(path = %entry.path, "Removing orphaned payload directory");
            if let Err(e) = self.storage.delete_dir(&entry.path).await {
                warn!(path = %entry.path, error = %e, "Failed to remove orphaned directory");
            } else {
                removed += 1;
                self.events.publish(ShareEvent::Expired {
                    code: code.to_string(),
                });
            }
        }
        Ok(removed)
    }

    async fn sweep_temp(&self) -> AppResult<u64> {
        let entries = match self.storage.list(layout::TEMP_DIR).await {
            Ok(entries) => entries,
            Err(e) if e.kind == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.temp_max_age)
                .unwrap_or_else(|_| chrono::Duration::hours(1));

        let mut removed = 0;
        for entry in entries {
            let stale = entry
                .last_modified
                .map(|modified| modified < cutoff)
                .unwrap_or(false);
            if !stale {
                continue;
            }

            debug!(path = %entry.path, "Removing stale temp entry");
            let result = if entry.is_directory {
                self.storage.delete_dir(&entry.path).await
            } else {
                self.storage.delete(&entry.path).await
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %entry.path, error = %e, "Failed to remove temp entry"),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;
    use chrono::Utc;
    use dropcode_core::config::store::MemoryStoreConfig;
    use dropcode_core::types::ShareCode;
    use dropcode_entity::file::FileDescriptor;
    use dropcode_entity::share::ShareRecord;
    use dropcode_storage::LocalStorageProvider;
    use dropcode_store::StoreManager;
    use dropcode_store::memory::MemoryShareStore;
    use uuid::Uuid;

    struct Fixture {
        _dir: tempfile::TempDir,
        records: ShareRecords,
        storage: Arc<dyn StorageProvider>,
        events: EventBus,
        sweep: SweepService,
    }

    async fn fixture(temp_max_age: Duration) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageProvider> = Arc::new(
            LocalStorageProvider::new(dir.path().to_str().unwrap())
                .await
                .unwrap(),
        );
        let store = MemoryShareStore::new(&MemoryStoreConfig::default(), 600);
        let records = ShareRecords::new(StoreManager::from_provider(Arc::new(store)));
        let events = EventBus::default();
        Fixture {
            _dir: dir,
            records: records.clone(),
            storage: storage.clone(),
            events: events.clone(),
            sweep: SweepService::new(records, storage, events, temp_max_age),
        }
    }

    async fn register(fx: &Fixture, code: &str) -> ShareCode {
        let code = ShareCode::parse(code).unwrap();
        let now = Utc::now();
        let record = ShareRecord {
            code: code.clone(),
            files: vec![FileDescriptor {
                id: Uuid::new_v4(),
                name: "a.txt".to_string(),
                mime_type: "text/plain".to_string(),
                size_bytes: 1,
                storage_path: format!("shares/{code}/a.txt"),
            }],
            display_name: "a.txt".to_string(),
            total_size_bytes: 1,
            created_at: now,
            expires_at: now + chrono::Duration::minutes(10),
            expiry_minutes: 10,
            max_downloads: Some(5),
            bundled: false,
        };
        assert!(
            fx.records
                .register(&record, Duration::from_secs(600))
                .await
                .unwrap()
        );
        code
    }

    #[tokio::test]
    async fn test_sweep_removes_orphaned_payload_dirs() {
        let fx = fixture(Duration::from_secs(3600)).await;

        let live = register(&fx, "AB2CD").await;
        fx.storage
            .write(&format!("shares/{live}/a.txt"), Bytes::from_static(b"a"))
            .await
            .unwrap();
        // Payload dir without a record, as left behind by expiry.
        fx.storage
            .write("shares/XYZW2/a.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        let report = fx.sweep.sweep().await.unwrap();
        assert_eq!(report.orphan_dirs_removed, 1);
        assert!(!fx.storage.exists("shares/XYZW2").await.unwrap());
        assert!(fx.storage.exists(&format!("shares/{live}")).await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_publishes_event_for_collected_orphans() {
        let fx = fixture(Duration::from_secs(3600)).await;
        let mut rx = fx.events.subscribe();
        fx.storage
            .write("shares/XYZW2/a.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        fx.sweep.sweep().await.unwrap();

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event.payload,
            ShareEvent::Expired { code } if code == "XYZW2"
        ));
    }

    #[tokio::test]
    async fn test_sweep_skips_foreign_directories() {
        let fx = fixture(Duration::from_secs(3600)).await;
        fx.storage
            .write("shares/not-a-code/junk", Bytes::from_static(b"?"))
            .await
            .unwrap();

        let report = fx.sweep.sweep().await.unwrap();
        assert_eq!(report.orphan_dirs_removed, 0);
        assert!(fx.storage.exists("shares/not-a-code").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_removes_stale_temp_entries() {
        // Zero max age makes every existing temp entry stale.
        let fx = fixture(Duration::ZERO).await;
        fx.storage
            .write("tmp/partial.zip", Bytes::from_static(b"zip"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let report = fx.sweep.sweep().await.unwrap();
        assert_eq!(report.temp_entries_removed, 1);
        assert!(!fx.storage.exists("tmp/partial.zip").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_temp_entries() {
        let fx = fixture(Duration::from_secs(3600)).await;
        fx.storage
            .write("tmp/inflight.zip", Bytes::from_static(b"zip"))
            .await
            .unwrap();

        let report = fx.sweep.sweep().await.unwrap();
        assert_eq!(report.temp_entries_removed, 0);
        assert!(fx.storage.exists("tmp/inflight.zip").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_on_empty_tree() {
        let fx = fixture(Duration::from_secs(3600)).await;
        let report = fx.sweep.sweep().await.unwrap();
        assert_eq!(report, SweepReport::default());
    }
}
