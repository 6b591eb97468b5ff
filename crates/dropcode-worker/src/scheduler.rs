//! Cron scheduler driving the periodic cleanup sweep.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{error, info};

use dropcode_core::error::AppError;
use dropcode_core::result::AppResult;

use crate::sweep::SweepService;

/// Cron-based scheduler running the cleanup sweep.
pub struct SweepScheduler {
    scheduler: JobScheduler,
    sweep: Arc<SweepService>,
}

impl std::fmt::Debug for SweepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepScheduler").finish()
    }
}

impl SweepScheduler {
    /// Create a new scheduler around the given sweep service.
    pub async fn new(sweep: Arc<SweepService>) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;
        Ok(Self { scheduler, sweep })
    }

    /// Register the sweep on the given six-field cron schedule.
    pub async fn register(&self, schedule: &str) -> AppResult<()> {
        let sweep = Arc::clone(&self.sweep);
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let sweep = Arc::clone(&sweep);
            Box::pin(async move {
                if let Err(e) = sweep.sweep().await {
                    error!(error = %e, "Cleanup sweep failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid sweep schedule '{schedule}': {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {e}")))?;

        info!(schedule, "Registered cleanup sweep");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;
        info!("Cleanup scheduler started");
        Ok(())
    }

    /// Shut the scheduler down.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;
        info!("Cleanup scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use dropcode_core::config::store::MemoryStoreConfig;
    use dropcode_core::events::EventBus;
    use dropcode_core::traits::storage::StorageProvider;
    use dropcode_service::ShareRecords;
    use dropcode_storage::LocalStorageProvider;
    use dropcode_store::StoreManager;
    use dropcode_store::memory::MemoryShareStore;

    async fn sweep_service(dir: &tempfile::TempDir) -> SweepService {
        let storage: Arc<dyn StorageProvider> = Arc::new(
            LocalStorageProvider::new(dir.path().to_str().unwrap())
                .await
                .unwrap(),
        );
        let store = MemoryShareStore::new(&MemoryStoreConfig::default(), 600);
        let records = ShareRecords::new(StoreManager::from_provider(Arc::new(store)));
        SweepService::new(records, storage, EventBus::default(), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_register_accepts_valid_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = SweepScheduler::new(Arc::new(sweep_service(&dir).await))
            .await
            .unwrap();
        scheduler.register("0 */5 * * * *").await.unwrap();
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = SweepScheduler::new(Arc::new(sweep_service(&dir).await))
            .await
            .unwrap();
        let err = scheduler.register("not a cron line").await.unwrap_err();
        assert_eq!(err.kind, dropcode_core::error::ErrorKind::Configuration);
    }
}
