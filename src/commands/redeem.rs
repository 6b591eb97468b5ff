//! Redeem command: consume a download and save the files locally.

use std::path::PathBuf;

use clap::Args;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use dropcode_core::config::AppConfig;
use dropcode_core::error::AppError;
use dropcode_core::types::ShareCode;

use crate::output::{self, OutputFormat};

use super::AppContext;

/// Arguments for the redeem command
#[derive(Debug, Args)]
pub struct RedeemArgs {
    /// The share code to redeem
    pub code: String,

    /// Directory to save the files into
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Save everything as one zip archive
    #[arg(short, long)]
    pub bundle: bool,
}

/// Execute the redeem command
pub async fn execute(
    args: &RedeemArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let code = ShareCode::parse(&args.code)?;
    let ctx = AppContext::build(config).await?;
    let service = ctx.redeem_service();

    let grant = service.redeem(&code).await?;

    tokio::fs::create_dir_all(&args.out)
        .await
        .map_err(|e| AppError::storage(format!("Failed to create {}: {e}", args.out.display())))?;

    let mut saved = Vec::new();
    if args.bundle || grant.bundled {
        let (name, data) = service.fetch_bundle(&grant).await?;
        let target = args.out.join(&name);
        tokio::fs::write(&target, &data)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write {name}: {e}")))?;
        saved.push(name);
    } else {
        for file in &grant.files {
            let target = args.out.join(&file.name);
            let mut stream = service.open(file).await?;
            let mut out = tokio::fs::File::create(&target).await.map_err(|e| {
                AppError::storage(format!("Failed to create {}: {e}", target.display()))
            })?;
            while let Some(chunk) = stream.next().await {
                let chunk =
                    chunk.map_err(|e| AppError::storage(format!("Stream read error: {e}")))?;
                out.write_all(&chunk).await.map_err(|e| {
                    AppError::storage(format!("Failed to write {}: {e}", target.display()))
                })?;
            }
            saved.push(file.name.clone());
        }
    }

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "code": grant.code,
            "saved": saved,
            "downloads": grant.downloads,
            "downloads_left": grant.downloads_left,
            "exhausted": grant.exhausted,
        })),
        OutputFormat::Text => {
            output::print_success(&format!(
                "Redeemed {}: saved {} file(s) to {}",
                grant.code,
                saved.len(),
                args.out.display()
            ));
            match grant.downloads_left {
                Some(left) => output::print_kv("remaining", &left.to_string()),
                None => output::print_kv("remaining", "unlimited"),
            }
            if grant.exhausted {
                output::print_warning("This was the last download; the code is now spent");
            }
        }
    }
    Ok(())
}
