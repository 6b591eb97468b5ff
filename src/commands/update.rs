//! Update command: change a live share's expiry or budget.

use clap::Args;

use dropcode_core::config::AppConfig;
use dropcode_core::error::AppError;
use dropcode_core::types::ShareCode;
use dropcode_entity::share::ShareSettingsUpdate;

use crate::output::{self, OutputFormat};

use super::AppContext;

/// Arguments for the update command
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// The share code to update
    pub code: String,

    /// New expiry window in minutes (re-bases the window from now)
    #[arg(short, long)]
    pub expiry: Option<u32>,

    /// New download budget
    #[arg(short, long, conflicts_with = "unlimited")]
    pub max_downloads: Option<u32>,

    /// Remove the download budget
    #[arg(short, long)]
    pub unlimited: bool,
}

/// Execute the update command
pub async fn execute(
    args: &UpdateArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let code = ShareCode::parse(&args.code)?;

    let max_downloads = if args.unlimited {
        Some(None)
    } else {
        args.max_downloads.map(Some)
    };
    let update = ShareSettingsUpdate {
        expiry_minutes: args.expiry,
        max_downloads,
    };
    if update.is_empty() {
        return Err(AppError::validation(
            "Nothing to update: pass --expiry, --max-downloads, or --unlimited",
        ));
    }

    let ctx = AppContext::build(config).await?;
    let summary = ctx.share_service().update_settings(&code, update).await?;

    match format {
        OutputFormat::Json => output::print_json(&summary),
        OutputFormat::Text => {
            output::print_success(&format!("Updated share {}", summary.code));
            output::print_kv("expires", &summary.expires_at.to_rfc3339());
            match summary.downloads_left {
                Some(left) => output::print_kv("remaining", &left.to_string()),
                None => output::print_kv("remaining", "unlimited"),
            }
        }
    }
    Ok(())
}
