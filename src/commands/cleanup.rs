//! Cleanup command: one sweep pass, then exit.

use clap::Args;

use dropcode_core::config::AppConfig;
use dropcode_core::error::AppError;

use crate::output::{self, OutputFormat};

use super::AppContext;

/// Arguments for the cleanup command
#[derive(Debug, Args)]
pub struct CleanupArgs {}

/// Execute the cleanup command
pub async fn execute(
    _args: &CleanupArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = AppContext::build(config).await?;
    let report = ctx.sweep_service().sweep().await?;

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "orphan_dirs_removed": report.orphan_dirs_removed,
            "temp_entries_removed": report.temp_entries_removed,
        })),
        OutputFormat::Text => {
            output::print_success("Cleanup sweep finished");
            output::print_kv("orphan dirs", &report.orphan_dirs_removed.to_string());
            output::print_kv("temp entries", &report.temp_entries_removed.to_string());
        }
    }
    Ok(())
}
