//! The redemption protocol.
//!
//! Budget accounting must stay correct when many holders redeem the same
//! code at once, so the live budget is a dedicated counter and a
//! redemption is a single atomic decrement. A decrement that lands below
//! zero lost the race for the last slot; it hands the slot back and the
//! caller sees the share as exhausted. The record JSON is never rewritten
//! on the redemption path.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};

use dropcode_core::error::AppError;
use dropcode_core::events::{EventBus, ShareEvent};
use dropcode_core::result::AppResult;
use dropcode_core::traits::storage::{ByteStream, StorageProvider};
use dropcode_core::types::ShareCode;
use dropcode_entity::file::FileDescriptor;
use dropcode_entity::share::{RedemptionGrant, ShareRecord};
use dropcode_storage::ZipBundler;

use crate::records::ShareRecords;

/// Service that redeems share codes and serves their payloads.
#[derive(Debug, Clone)]
pub struct RedeemService {
    records: ShareRecords,
    storage: Arc<dyn StorageProvider>,
    bundler: ZipBundler,
    events: EventBus,
}

impl RedeemService {
    /// Create a new redeem service.
    pub fn new(records: ShareRecords, storage: Arc<dyn StorageProvider>, events: EventBus) -> Self {
        Self {
            records,
            storage,
            bundler: ZipBundler::new(),
            events,
        }
    }

    /// Redeem a code: consume one unit of the download budget and return
    /// a grant for the payloads.
    ///
    /// Consuming the last unit destroys the record, so the code stops
    /// resolving the moment the budget is spent; the payload files remain
    /// until this grant is served and the sweep collects them.
    pub async fn redeem(&self, code: &ShareCode) -> AppResult<RedemptionGrant> {
        let record = self.load_live(code).await?;

        // Payloads can disappear out from under the record (manual
        // cleanup, disk loss). Fail the redemption before spending budget.
        for file in &record.files {
            if !self.storage.exists(&file.storage_path).await? {
                warn!(code = %code, path = %file.storage_path, "Share payload missing");
                self.records.destroy(code).await?;
                return Err(AppError::not_found("Share payload is no longer available"));
            }
        }

        let (downloads_left, exhausted) = match record.max_downloads {
            None => (None, false),
            Some(_) => {
                let left = self.records.consume_slot(code).await?;
                if left < 0 {
                    // Lost the race for the last slot (or the counter
                    // expired separately). Undo the overdraw.
                    self.records.release_slot(code).await?;
                    return Err(AppError::exhausted("Download limit reached"));
                }
                (Some(left as u32), left == 0)
            }
        };

        let downloads = self.records.count_download(code).await?;

        if exhausted {
            self.records.destroy(code).await?;
            info!(code = %code, downloads, "Share budget exhausted, record destroyed");
            self.events.publish(ShareEvent::Exhausted {
                code: code.to_string(),
            });
        }

        self.events.publish(ShareEvent::Redeemed {
            code: code.to_string(),
            downloads_left,
            downloads,
        });
        info!(code = %code, ?downloads_left, downloads, "Redeemed share");

        Ok(RedemptionGrant {
            code: code.clone(),
            display_name: record.display_name,
            files: record.files,
            bundled: record.bundled,
            downloads_left,
            downloads,
            exhausted,
        })
    }

    /// Stream one payload file from a grant.
    pub async fn open(&self, file: &FileDescriptor) -> AppResult<ByteStream> {
        self.storage.read(&file.storage_path).await
    }

    /// Read one payload file from a grant into memory.
    pub async fn fetch(&self, file: &FileDescriptor) -> AppResult<Bytes> {
        self.storage.read_bytes(&file.storage_path).await
    }

    /// Fetch a grant's payloads as one `(name, bytes)` zip archive.
    ///
    /// Degraded shares already are a single bundle; anything else is
    /// packed on demand.
    pub async fn fetch_bundle(&self, grant: &RedemptionGrant) -> AppResult<(String, Bytes)> {
        let name = format!("{}.zip", grant.code);
        if grant.bundled {
            if let [bundle] = grant.files.as_slice() {
                return Ok((name, self.fetch(bundle).await?));
            }
        }

        let mut entries = Vec::with_capacity(grant.files.len());
        for file in &grant.files {
            entries.push((file.name.clone(), self.fetch(file).await?));
        }
        Ok((name, self.bundler.bundle(entries).await?))
    }

    /// Load the record behind a code, destroying it when expired.
    ///
    /// Expiry is checked against the record's own timestamp as well as
    /// the store TTL, so a backend with coarse expiry still refuses the
    /// moment the window closes.
    async fn load_live(&self, code: &ShareCode) -> AppResult<ShareRecord> {
        let record = self
            .records
            .load(code)
            .await?
            .ok_or_else(|| AppError::not_found("Share not found or expired"))?;

        if record.is_expired(Utc::now()) {
            self.records.destroy(code).await?;
            self.events.publish(ShareEvent::Expired {
                code: code.to_string(),
            });
            return Err(AppError::not_found("Share has expired"));
        }

        Ok(record)
    }
}
