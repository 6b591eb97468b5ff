//! Health command: check the configured backends.

use clap::Args;

use dropcode_core::config::AppConfig;
use dropcode_core::error::AppError;
use dropcode_core::traits::store::ShareStore;

use crate::output;

use super::AppContext;

/// Arguments for the health command
#[derive(Debug, Args)]
pub struct HealthArgs {}

/// Execute the health command
pub async fn execute(_args: &HealthArgs, config: AppConfig) -> Result<(), AppError> {
    let store_provider = config.store.provider.clone();
    let ctx = AppContext::build(config).await?;

    let store_ok = ctx.store.health_check().await.unwrap_or(false);
    let storage_ok = ctx.storage.health_check().await.unwrap_or(false);

    output::print_kv(
        &format!("store ({store_provider})"),
        if store_ok { "ok" } else { "unreachable" },
    );
    output::print_kv(
        &format!("storage ({})", ctx.storage.provider_type()),
        if storage_ok { "ok" } else { "unreachable" },
    );

    if store_ok && storage_ok {
        output::print_success("All backends healthy");
        Ok(())
    } else {
        Err(AppError::service_unavailable("One or more backends failed"))
    }
}
