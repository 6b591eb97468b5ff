//! Upload registration: persist payloads, claim a code, arm the counters.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use dropcode_core::config::share::ShareConfig;
use dropcode_core::error::AppError;
use dropcode_core::events::{EventBus, ShareEvent};
use dropcode_core::result::AppResult;
use dropcode_core::traits::storage::StorageProvider;
use dropcode_core::types::ShareCode;
use dropcode_entity::file::FileDescriptor;
use dropcode_entity::share::ShareRecord;
use dropcode_storage::{ZipBundler, layout};

use crate::codegen::CodeGenerator;
use crate::records::ShareRecords;

/// One file submitted for sharing.
#[derive(Debug, Clone, Default)]
pub struct UploadFile {
    /// Original file name.
    pub name: String,
    /// Declared MIME type; guessed from the name when absent.
    pub mime_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

/// A request to create a share.
#[derive(Debug, Clone, Default)]
pub struct CreateShareRequest {
    /// Files to share.
    pub files: Vec<UploadFile>,
    /// Expiry window in minutes; the configured default when absent.
    pub expiry_minutes: Option<u32>,
    /// Download budget; the configured default when absent,
    /// `Some(None)` for unlimited.
    pub max_downloads: Option<Option<u32>>,
}

/// The outcome of a successful upload: a live share behind a fresh code.
#[derive(Debug, Clone)]
pub struct CreatedShare {
    /// The allocated share code.
    pub code: ShareCode,
    /// Display name for the share.
    pub display_name: String,
    /// Number of logical files shared.
    pub file_count: usize,
    /// Total payload size in bytes.
    pub total_size_bytes: u64,
    /// When the share expires.
    pub expires_at: chrono::DateTime<Utc>,
    /// The expiry window in minutes.
    pub expiry_minutes: u32,
    /// Download budget (`None` = unlimited).
    pub max_downloads: Option<u32>,
    /// Whether the payload was degraded to a single zip bundle.
    pub bundled: bool,
}

/// Service that turns a set of files into a redeemable share.
#[derive(Debug, Clone)]
pub struct UploadService {
    records: ShareRecords,
    storage: Arc<dyn StorageProvider>,
    bundler: ZipBundler,
    codegen: CodeGenerator,
    events: EventBus,
    config: ShareConfig,
    max_upload_size_bytes: u64,
}

impl UploadService {
    /// Create a new upload service.
    pub fn new(
        records: ShareRecords,
        storage: Arc<dyn StorageProvider>,
        events: EventBus,
        config: ShareConfig,
        max_upload_size_bytes: u64,
    ) -> Self {
        let codegen = CodeGenerator::new(config.code_length);
        Self {
            records,
            storage,
            bundler: ZipBundler::new(),
            codegen,
            events,
            config,
            max_upload_size_bytes,
        }
    }

    /// Register a share: persist the payloads, claim an unused code, and
    /// arm the expiry and budget counters.
    pub async fn create(&self, request: CreateShareRequest) -> AppResult<CreatedShare> {
        self.validate(&request)?;

        let expiry_minutes = request
            .expiry_minutes
            .unwrap_or(self.config.default_expiry_minutes);
        let max_downloads = request
            .max_downloads
            .unwrap_or(self.config.default_max_downloads);
        let ttl = Duration::from_secs(u64::from(expiry_minutes) * 60);
        let total_size_bytes: u64 = request.files.iter().map(|f| f.data.len() as u64).sum();

        for attempt in 1..=self.config.max_collision_attempts {
            let code = self.codegen.generate();
            if self.records.exists(&code).await? {
                warn!(code = %code, attempt, "Share code collision, retrying");
                continue;
            }

            let (files, bundled) = self.persist_payloads(&code, &request.files).await?;

            let now = Utc::now();
            let record = ShareRecord {
                code: code.clone(),
                display_name: ShareRecord::display_name_for(&files),
                total_size_bytes,
                created_at: now,
                expires_at: now + chrono::Duration::seconds(ttl.as_secs() as i64),
                expiry_minutes,
                max_downloads,
                bundled,
                files,
            };

            let registered = match self.records.register(&record, ttl).await {
                Ok(registered) => registered,
                Err(e) => {
                    self.discard_payloads(&record.files).await;
                    return Err(e);
                }
            };
            if !registered {
                // Lost the claim to a concurrent upload between the
                // existence check and the registration.
                warn!(code = %code, attempt, "Share code claimed concurrently, retrying");
                self.discard_payloads(&record.files).await;
                continue;
            }

            if let Err(e) = self.arm_counters(&code, max_downloads, ttl).await {
                // A claimed record without armed counters would refuse
                // every redemption. Roll the registration back so the
                // caller can retry from a clean slate.
                if let Err(cleanup) = self.records.destroy(&code).await {
                    warn!(code = %code, error = %cleanup, "Failed to roll back share registration");
                }
                self.discard_payloads(&record.files).await;
                return Err(e);
            }

            info!(
                code = %code,
                files = record.files.len(),
                bytes = total_size_bytes,
                bundled,
                "Registered share"
            );
            self.events.publish(ShareEvent::Created {
                code: code.to_string(),
                file_count: request.files.len(),
                total_size: total_size_bytes,
                bundled,
            });

            return Ok(CreatedShare {
                code,
                display_name: record.display_name,
                file_count: request.files.len(),
                total_size_bytes,
                expires_at: record.expires_at,
                expiry_minutes,
                max_downloads,
                bundled,
            });
        }

        Err(AppError::service_unavailable(
            "Could not allocate a unique share code, try again",
        ))
    }

    fn validate(&self, request: &CreateShareRequest) -> AppResult<()> {
        if request.files.is_empty() {
            return Err(AppError::validation("At least one file is required"));
        }
        if request.files.iter().any(|f| f.name.trim().is_empty()) {
            return Err(AppError::validation("File names must not be empty"));
        }
        let total: u64 = request.files.iter().map(|f| f.data.len() as u64).sum();
        if total > self.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "Upload of {total} bytes exceeds the {} byte limit",
                self.max_upload_size_bytes
            )));
        }
        if let Some(minutes) = request.expiry_minutes {
            if !self.config.allowed_expiry_minutes.contains(&minutes) {
                return Err(AppError::validation(format!(
                    "Expiry must be one of {:?} minutes",
                    self.config.allowed_expiry_minutes
                )));
            }
        }
        if request.max_downloads == Some(Some(0)) {
            return Err(AppError::validation("Download budget must be at least 1"));
        }
        Ok(())
    }

    /// Write each payload to its own object; if any write fails, fall
    /// back to packing everything into a single zip bundle so the upload
    /// still succeeds in degraded form.
    async fn persist_payloads(
        &self,
        code: &ShareCode,
        files: &[UploadFile],
    ) -> AppResult<(Vec<FileDescriptor>, bool)> {
        let mut descriptors = Vec::with_capacity(files.len());

        for file in files {
            let id = Uuid::new_v4();
            let storage_path = layout::payload_file(code, id, &file.name);
            if let Err(e) = self.storage.write(&storage_path, file.data.clone()).await {
                warn!(
                    code = %code,
                    file = %file.name,
                    error = %e,
                    "Per-file persistence failed, degrading to zip bundle"
                );
                self.discard_payloads(&descriptors).await;
                let descriptor = self.persist_bundle(code, files).await?;
                return Ok((vec![descriptor], true));
            }
            descriptors.push(FileDescriptor {
                id,
                name: file.name.clone(),
                mime_type: resolve_mime(file),
                size_bytes: file.data.len() as u64,
                storage_path,
            });
        }

        Ok((descriptors, false))
    }

    async fn persist_bundle(
        &self,
        code: &ShareCode,
        files: &[UploadFile],
    ) -> AppResult<FileDescriptor> {
        let entries: Vec<(String, Bytes)> = files
            .iter()
            .map(|f| (f.name.clone(), f.data.clone()))
            .collect();
        let archive = self.bundler.bundle(entries).await?;

        let storage_path = layout::bundle_file(code);
        let size_bytes = archive.len() as u64;
        self.storage.write(&storage_path, archive).await?;

        Ok(FileDescriptor {
            id: Uuid::new_v4(),
            name: format!("{code}.zip"),
            mime_type: "application/zip".to_string(),
            size_bytes,
            storage_path,
        })
    }

    async fn arm_counters(
        &self,
        code: &ShareCode,
        max_downloads: Option<u32>,
        ttl: Duration,
    ) -> AppResult<()> {
        if let Some(budget) = max_downloads {
            self.records.set_slots(code, budget, ttl).await?;
        }
        self.records.set_downloads(code, 0, ttl).await
    }

    /// Remove the payload objects one attempt wrote. Only this attempt's
    /// own paths are touched: a concurrent upload that won the same code
    /// keeps its files in the shared directory. Best effort, anything
    /// left behind is collected by the sweep.
    async fn discard_payloads(&self, files: &[FileDescriptor]) {
        for file in files {
            if let Err(e) = self.storage.delete(&file.storage_path).await {
                warn!(path = %file.storage_path, error = %e, "Failed to remove discarded payload");
            }
        }
    }
}

/// Resolve a file's MIME type: the declared one when present, otherwise
/// guessed from the file name.
fn resolve_mime(file: &UploadFile) -> String {
    match &file.mime_type {
        Some(mime) if !mime.trim().is_empty() => mime.clone(),
        _ => mime_guess::from_path(&file.name)
            .first_or_octet_stream()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use dropcode_core::config::store::MemoryStoreConfig;
    use dropcode_core::traits::storage::{ByteStream, StorageObjectMeta};
    use dropcode_core::traits::store::ShareStore;
    use dropcode_storage::LocalStorageProvider;
    use dropcode_store::StoreManager;
    use dropcode_store::memory::MemoryShareStore;

    fn records() -> ShareRecords {
        let store = MemoryShareStore::new(&MemoryStoreConfig::default(), 600);
        ShareRecords::new(StoreManager::from_provider(Arc::new(store)))
    }

    async fn service_with_dir() -> (tempfile::TempDir, UploadService, ShareRecords) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        let records = records();
        let service = UploadService::new(
            records.clone(),
            Arc::new(storage),
            EventBus::default(),
            ShareConfig::default(),
            1024 * 1024,
        );
        (dir, service, records)
    }

    fn request(names: &[&str]) -> CreateShareRequest {
        CreateShareRequest {
            files: names
                .iter()
                .map(|n| UploadFile {
                    name: n.to_string(),
                    mime_type: None,
                    data: Bytes::from_static(b"payload"),
                })
                .collect(),
            ..CreateShareRequest::default()
        }
    }

    #[tokio::test]
    async fn test_create_single_file_share() {
        let (_dir, service, records) = service_with_dir().await;
        let created = service.create(request(&["notes.txt"])).await.unwrap();

        assert_eq!(created.display_name, "notes.txt");
        assert_eq!(created.max_downloads, Some(5));
        assert!(!created.bundled);

        let record = records.load(&created.code).await.unwrap().unwrap();
        assert_eq!(record.files.len(), 1);
        assert_eq!(record.files[0].mime_type, "text/plain");
        assert_eq!(records.slots_left(&created.code).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_create_multi_file_share_display_name() {
        let (_dir, service, _) = service_with_dir().await;
        let created = service
            .create(request(&["a.txt", "b.txt", "c.txt"]))
            .await
            .unwrap();
        assert_eq!(created.display_name, "3 files");
        assert_eq!(created.file_count, 3);
    }

    #[tokio::test]
    async fn test_unlimited_budget_skips_slots_counter() {
        let (_dir, service, records) = service_with_dir().await;
        let created = service
            .create(CreateShareRequest {
                max_downloads: Some(None),
                ..request(&["a.txt"])
            })
            .await
            .unwrap();
        assert_eq!(created.max_downloads, None);
        assert_eq!(records.slots_left(&created.code).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let (_dir, service, _) = service_with_dir().await;
        let err = service.create(request(&[])).await.unwrap_err();
        assert_eq!(err.kind, dropcode_core::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let (_dir, service, _) = service_with_dir().await;
        let req = CreateShareRequest {
            files: vec![UploadFile {
                name: "big.bin".to_string(),
                mime_type: None,
                data: Bytes::from(vec![0u8; 2 * 1024 * 1024]),
            }],
            ..CreateShareRequest::default()
        };
        let err = service.create(req).await.unwrap_err();
        assert_eq!(err.kind, dropcode_core::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_disallowed_expiry_rejected() {
        let (_dir, service, _) = service_with_dir().await;
        let req = CreateShareRequest {
            expiry_minutes: Some(7),
            ..request(&["a.txt"])
        };
        let err = service.create(req).await.unwrap_err();
        assert_eq!(err.kind, dropcode_core::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_zero_budget_rejected() {
        let (_dir, service, _) = service_with_dir().await;
        let req = CreateShareRequest {
            max_downloads: Some(Some(0)),
            ..request(&["a.txt"])
        };
        assert!(service.create(req).await.is_err());
    }

    /// Storage double whose per-file writes fail but bundle writes succeed.
    #[derive(Debug)]
    struct FlakyStorage {
        inner: LocalStorageProvider,
        fail_payloads: AtomicBool,
    }

    #[async_trait]
    impl StorageProvider for FlakyStorage {
        fn provider_type(&self) -> &str {
            "flaky"
        }
        async fn health_check(&self) -> dropcode_core::result::AppResult<bool> {
            self.inner.health_check().await
        }
        async fn read(&self, path: &str) -> dropcode_core::result::AppResult<ByteStream> {
            self.inner.read(path).await
        }
        async fn read_bytes(&self, path: &str) -> dropcode_core::result::AppResult<Bytes> {
            self.inner.read_bytes(path).await
        }
        async fn write(&self, path: &str, data: Bytes) -> dropcode_core::result::AppResult<()> {
            if self.fail_payloads.load(Ordering::SeqCst) && !path.ends_with(".zip") {
                return Err(dropcode_core::error::AppError::storage("Disk full"));
            }
            self.inner.write(path, data).await
        }
        async fn write_stream(
            &self,
            path: &str,
            stream: ByteStream,
        ) -> dropcode_core::result::AppResult<u64> {
            self.inner.write_stream(path, stream).await
        }
        async fn delete(&self, path: &str) -> dropcode_core::result::AppResult<()> {
            self.inner.delete(path).await
        }
        async fn delete_dir(&self, path: &str) -> dropcode_core::result::AppResult<()> {
            self.inner.delete_dir(path).await
        }
        async fn exists(&self, path: &str) -> dropcode_core::result::AppResult<bool> {
            self.inner.exists(path).await
        }
        async fn metadata(
            &self,
            path: &str,
        ) -> dropcode_core::result::AppResult<StorageObjectMeta> {
            self.inner.metadata(path).await
        }
        async fn list(
            &self,
            path: &str,
        ) -> dropcode_core::result::AppResult<Vec<StorageObjectMeta>> {
            self.inner.list(path).await
        }
    }

    #[tokio::test]
    async fn test_write_failure_degrades_to_zip_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FlakyStorage {
            inner: LocalStorageProvider::new(dir.path().to_str().unwrap())
                .await
                .unwrap(),
            fail_payloads: AtomicBool::new(true),
        };
        let records = records();
        let service = UploadService::new(
            records.clone(),
            Arc::new(storage),
            EventBus::default(),
            ShareConfig::default(),
            1024 * 1024,
        );

        let created = service.create(request(&["a.txt", "b.txt"])).await.unwrap();
        assert!(created.bundled);

        let record = records.load(&created.code).await.unwrap().unwrap();
        assert_eq!(record.files.len(), 1);
        assert!(record.files[0].name.ends_with(".zip"));
        assert_eq!(record.files[0].mime_type, "application/zip");
    }

    /// Store double whose writes to slot-counter keys fail.
    #[derive(Debug)]
    struct SlotsDownStore {
        inner: MemoryShareStore,
    }

    #[async_trait]
    impl ShareStore for SlotsDownStore {
        async fn get(&self, key: &str) -> dropcode_core::result::AppResult<Option<String>> {
            self.inner.get(key).await
        }
        async fn set(
            &self,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> dropcode_core::result::AppResult<()> {
            if key.ends_with(":slots") {
                return Err(AppError::store("Connection reset"));
            }
            self.inner.set(key, value, ttl).await
        }
        async fn set_nx(
            &self,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> dropcode_core::result::AppResult<bool> {
            self.inner.set_nx(key, value, ttl).await
        }
        async fn delete(&self, key: &str) -> dropcode_core::result::AppResult<()> {
            self.inner.delete(key).await
        }
        async fn exists(&self, key: &str) -> dropcode_core::result::AppResult<bool> {
            self.inner.exists(key).await
        }
        async fn incr(&self, key: &str) -> dropcode_core::result::AppResult<i64> {
            self.inner.incr(key).await
        }
        async fn decr(&self, key: &str) -> dropcode_core::result::AppResult<i64> {
            self.inner.decr(key).await
        }
        async fn expire(&self, key: &str, ttl: Duration) -> dropcode_core::result::AppResult<bool> {
            self.inner.expire(key, ttl).await
        }
        async fn ttl(&self, key: &str) -> dropcode_core::result::AppResult<Option<Duration>> {
            self.inner.ttl(key).await
        }
        async fn health_check(&self) -> dropcode_core::result::AppResult<bool> {
            self.inner.health_check().await
        }
    }

    #[tokio::test]
    async fn test_failed_counter_arming_rolls_back_registration() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageProvider> = Arc::new(
            LocalStorageProvider::new(dir.path().to_str().unwrap())
                .await
                .unwrap(),
        );
        let store = SlotsDownStore {
            inner: MemoryShareStore::new(&MemoryStoreConfig::default(), 600),
        };
        let records = ShareRecords::new(StoreManager::from_provider(Arc::new(store)));
        let events = EventBus::default();
        let service = UploadService::new(
            records.clone(),
            storage.clone(),
            events.clone(),
            ShareConfig::default(),
            1024 * 1024,
        );

        let err = service.create(request(&["a.txt"])).await.unwrap_err();
        assert_eq!(err.kind, dropcode_core::error::ErrorKind::Store);

        // The attempted code must leave no claimed record and no payload
        // behind; a half-registered share would refuse every redemption.
        let dirs = storage.list("shares").await.unwrap();
        assert!(!dirs.is_empty());
        let redeem =
            crate::redeem::RedeemService::new(records.clone(), storage.clone(), events);
        for entry in dirs {
            let name = entry.path.rsplit('/').next().unwrap().to_string();
            let code = ShareCode::parse(&name).unwrap();
            assert!(!records.exists(&code).await.unwrap());
            assert!(storage.list(&entry.path).await.unwrap().is_empty());
            assert_eq!(
                redeem.redeem(&code).await.unwrap_err().kind,
                dropcode_core::error::ErrorKind::NotFound
            );
        }
    }

    #[tokio::test]
    async fn test_discard_removes_only_own_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageProvider> = Arc::new(
            LocalStorageProvider::new(dir.path().to_str().unwrap())
                .await
                .unwrap(),
        );
        let service = UploadService::new(
            records(),
            storage.clone(),
            EventBus::default(),
            ShareConfig::default(),
            1024 * 1024,
        );

        // Two uploads racing on the same code write into the same
        // directory; the one that loses the claim must not take the
        // winner's files with it.
        let code = ShareCode::parse("AB2CD").unwrap();
        let winner = layout::payload_file(&code, Uuid::new_v4(), "winner.txt");
        let loser = layout::payload_file(&code, Uuid::new_v4(), "loser.txt");
        storage.write(&winner, Bytes::from_static(b"w")).await.unwrap();
        storage.write(&loser, Bytes::from_static(b"l")).await.unwrap();

        service
            .discard_payloads(&[FileDescriptor {
                id: Uuid::new_v4(),
                name: "loser.txt".to_string(),
                mime_type: "text/plain".to_string(),
                size_bytes: 1,
                storage_path: loser.clone(),
            }])
            .await;

        assert!(storage.exists(&winner).await.unwrap());
        assert!(!storage.exists(&loser).await.unwrap());
    }

    #[tokio::test]
    async fn test_created_event_published() {
        let (_dir, service, _) = service_with_dir().await;
        let mut rx = service.events.subscribe();
        service.create(request(&["a.txt"])).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event.payload,
            ShareEvent::Created { file_count: 1, .. }
        ));
    }
}
