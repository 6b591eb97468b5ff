//! CLI command definitions and dispatch.

pub mod cleanup;
pub mod daemon;
pub mod destroy;
pub mod health;
pub mod info;
pub mod redeem;
pub mod update;
pub mod upload;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use dropcode_core::config::AppConfig;
use dropcode_core::error::AppError;
use dropcode_core::events::EventBus;
use dropcode_core::traits::storage::StorageProvider;
use dropcode_service::{RedeemService, ShareRecords, ShareService, UploadService};
use dropcode_storage::LocalStorageProvider;
use dropcode_store::StoreManager;
use dropcode_worker::SweepService;

use crate::output::OutputFormat;

/// DropCode — share files behind short ephemeral codes
#[derive(Debug, Parser)]
#[command(name = "dropcode", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (reads config/default.toml plus
    /// config/<env>.toml)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload files and get a share code
    Upload(upload::UploadArgs),
    /// Look up a share code without consuming a download
    Info(info::InfoArgs),
    /// Redeem a share code and download its files
    Redeem(redeem::RedeemArgs),
    /// Change the expiry or download budget of a live share
    Update(update::UpdateArgs),
    /// Destroy a share and its payloads
    Destroy(destroy::DestroyArgs),
    /// Run one cleanup sweep and exit
    Cleanup(cleanup::CleanupArgs),
    /// Check store and storage backends
    Health(health::HealthArgs),
    /// Run the cleanup daemon until interrupted
    Daemon(daemon::DaemonArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Upload(args) => upload::execute(args, config, self.format).await,
            Commands::Info(args) => info::execute(args, config, self.format).await,
            Commands::Redeem(args) => redeem::execute(args, config, self.format).await,
            Commands::Update(args) => update::execute(args, config, self.format).await,
            Commands::Destroy(args) => destroy::execute(args, config).await,
            Commands::Cleanup(args) => cleanup::execute(args, config, self.format).await,
            Commands::Health(args) => health::execute(args, config).await,
            Commands::Daemon(args) => daemon::execute(args, config).await,
        }
    }
}

/// All wired-up services a command may need.
pub struct AppContext {
    /// Loaded configuration.
    pub config: AppConfig,
    /// The configured key-value store.
    pub store: StoreManager,
    /// Record repository over the configured store.
    pub records: ShareRecords,
    /// Configured payload storage backend.
    pub storage: Arc<dyn StorageProvider>,
    /// In-process event bus.
    pub events: EventBus,
}

impl AppContext {
    /// Build the context: connect the store and open the storage root.
    pub async fn build(config: AppConfig) -> Result<Self, AppError> {
        let store = StoreManager::new(&config.store).await?;
        let storage: Arc<dyn StorageProvider> =
            Arc::new(LocalStorageProvider::new(&config.storage.local.root_path).await?);
        Ok(Self {
            records: ShareRecords::new(store.clone()),
            store,
            storage,
            events: EventBus::default(),
            config,
        })
    }

    /// Upload service wired to this context.
    pub fn upload_service(&self) -> UploadService {
        UploadService::new(
            self.records.clone(),
            self.storage.clone(),
            self.events.clone(),
            self.config.share.clone(),
            self.config.storage.max_upload_size_bytes,
        )
    }

    /// Redeem service wired to this context.
    pub fn redeem_service(&self) -> RedeemService {
        RedeemService::new(
            self.records.clone(),
            self.storage.clone(),
            self.events.clone(),
        )
    }

    /// Verification/settings service wired to this context.
    pub fn share_service(&self) -> ShareService {
        ShareService::new(
            self.records.clone(),
            self.storage.clone(),
            self.events.clone(),
            self.config.share.clone(),
        )
    }

    /// Cleanup sweep wired to this context.
    pub fn sweep_service(&self) -> SweepService {
        SweepService::new(
            self.records.clone(),
            self.storage.clone(),
            self.events.clone(),
            std::time::Duration::from_secs(self.config.worker.temp_max_age_minutes * 60),
        )
    }
}
