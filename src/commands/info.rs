//! Info command: verify a code without consuming a download.

use clap::Args;

use dropcode_core::config::AppConfig;
use dropcode_core::error::AppError;
use dropcode_core::types::ShareCode;

use crate::output::{self, OutputFormat};

use super::AppContext;

/// Arguments for the info command
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// The share code to look up
    pub code: String,
}

/// Execute the info command
pub async fn execute(
    args: &InfoArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let code = ShareCode::parse(&args.code)?;
    let ctx = AppContext::build(config).await?;
    let summary = ctx.share_service().verify(&code).await?;

    match format {
        OutputFormat::Json => output::print_json(&summary),
        OutputFormat::Text => {
            println!("Share {}", summary.code);
            output::print_kv("name", &summary.display_name);
            output::print_kv("files", &summary.file_count.to_string());
            output::print_kv("size", &output::human_size(summary.total_size_bytes));
            output::print_kv("type", &summary.mime_type);
            output::print_kv("created", &summary.created_at.to_rfc3339());
            output::print_kv("expires", &summary.expires_at.to_rfc3339());
            output::print_kv("downloads", &summary.downloads.to_string());
            match summary.downloads_left {
                Some(left) => output::print_kv("remaining", &left.to_string()),
                None => output::print_kv("remaining", "unlimited"),
            }
            output::print_kv(
                "status",
                if summary.redeemable {
                    "redeemable"
                } else {
                    "exhausted"
                },
            );
        }
    }
    Ok(())
}
