//! Verification and settings updates for live shares.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use dropcode_core::config::share::ShareConfig;
use dropcode_core::error::AppError;
use dropcode_core::events::{EventBus, ShareEvent};
use dropcode_core::result::AppResult;
use dropcode_core::traits::storage::StorageProvider;
use dropcode_core::types::ShareCode;
use dropcode_entity::share::{ShareRecord, ShareSettingsUpdate, ShareSummary};
use dropcode_storage::layout;

use crate::records::ShareRecords;

/// Service for inspecting and reconfiguring shares without consuming
/// download budget.
#[derive(Debug, Clone)]
pub struct ShareService {
    records: ShareRecords,
    storage: Arc<dyn StorageProvider>,
    events: EventBus,
    config: ShareConfig,
}

impl ShareService {
    /// Create a new share service.
    pub fn new(
        records: ShareRecords,
        storage: Arc<dyn StorageProvider>,
        events: EventBus,
        config: ShareConfig,
    ) -> Self {
        Self {
            records,
            storage,
            events,
            config,
        }
    }

    /// Look up a share without consuming budget.
    pub async fn verify(&self, code: &ShareCode) -> AppResult<ShareSummary> {
        let record = self.load_live(code).await?;
        self.summarize(record).await
    }

    /// Apply a settings update to a live share.
    ///
    /// Changing the expiry re-bases the window from now; leaving it
    /// untouched preserves the remaining time. Changing the budget resets
    /// the remaining slots to the new budget minus downloads already
    /// served.
    pub async fn update_settings(
        &self,
        code: &ShareCode,
        update: ShareSettingsUpdate,
    ) -> AppResult<ShareSummary> {
        if update.is_empty() {
            return self.verify(code).await;
        }
        if let Some(minutes) = update.expiry_minutes {
            if !self.config.allowed_expiry_minutes.contains(&minutes) {
                return Err(AppError::validation(format!(
                    "Expiry must be one of {:?} minutes",
                    self.config.allowed_expiry_minutes
                )));
            }
        }
        if update.max_downloads == Some(Some(0)) {
            return Err(AppError::validation("Download budget must be at least 1"));
        }

        let mut record = self.load_live(code).await?;
        let now = Utc::now();

        let ttl = match update.expiry_minutes {
            Some(minutes) => {
                record.expiry_minutes = minutes;
                record.expires_at = now + chrono::Duration::minutes(i64::from(minutes));
                Duration::from_secs(u64::from(minutes) * 60)
            }
            None => self
                .records
                .ttl(code)
                .await?
                .unwrap_or(Duration::from_secs(
                    u64::from(self.config.default_expiry_minutes) * 60,
                )),
        };

        if let Some(budget) = update.max_downloads {
            record.max_downloads = budget;
        }

        self.records.save(&record, ttl).await?;

        // Reconcile the live counter with the (possibly new) budget, then
        // put the record and both counters on the same clock.
        if let Some(Some(budget)) = update.max_downloads {
            let served = self.records.downloads(code).await?;
            let remaining = budget.saturating_sub(served.min(u64::from(u32::MAX)) as u32);
            self.records.set_slots(code, remaining, ttl).await?;
        }
        self.records.refresh_ttl(code, ttl).await?;

        info!(
            code = %code,
            expiry_minutes = ?update.expiry_minutes,
            max_downloads = ?update.max_downloads,
            "Updated share settings"
        );
        self.events.publish(ShareEvent::SettingsUpdated {
            code: code.to_string(),
            expiry_minutes: update.expiry_minutes,
            max_downloads: update.max_downloads,
        });

        self.summarize(record).await
    }

    /// Destroy a share outright: record, counters, and payloads.
    pub async fn destroy(&self, code: &ShareCode) -> AppResult<()> {
        self.records.destroy(code).await?;
        self.storage.delete_dir(&layout::payload_dir(code)).await?;
        info!(code = %code, "Destroyed share");
        Ok(())
    }

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

    async fn summarize(&self, record: ShareRecord) -> AppResult<ShareSummary> {
        let downloads_left = match record.max_downloads {
            None => None,
            Some(_) => Some(self.records.slots_left(&record.code).await?.unwrap_or(0)),
        };
        let downloads = self.records.downloads(&record.code).await?;
        let redeemable = record.is_redeemable(Utc::now(), downloads_left);
        let mime_type = record
            .files
            .first()
            .map(|f| f.mime_type.clone())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Ok(ShareSummary {
            code: record.code,
            display_name: record.display_name,
            total_size_bytes: record.total_size_bytes,
            file_count: record.files.len(),
            mime_type,
            created_at: record.created_at,
            expires_at: record.expires_at,
            expiry_minutes: record.expiry_minutes,
            max_downloads: record.max_downloads,
            downloads_left,
            downloads,
            redeemable,
        })
    }
}
