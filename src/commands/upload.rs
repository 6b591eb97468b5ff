//! Upload command: share files and print the code.

use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;

use dropcode_core::config::AppConfig;
use dropcode_core::error::AppError;
use dropcode_service::upload::{CreateShareRequest, UploadFile};

use crate::output::{self, OutputFormat};

use super::AppContext;

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Files to share
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Expiry window in minutes
    #[arg(short, long)]
    pub expiry: Option<u32>,

    /// Download budget
    #[arg(short, long, conflicts_with = "unlimited")]
    pub max_downloads: Option<u32>,

    /// No download budget
    #[arg(short, long)]
    pub unlimited: bool,
}

/// Execute the upload command
pub async fn execute(
    args: &UploadArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = AppContext::build(config).await?;
    let service = ctx.upload_service();

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::validation(format!("Invalid file name: {}", path.display())))?
            .to_string();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::storage(format!("Failed to read {}: {e}", path.display())))?;
        files.push(UploadFile {
            name,
            mime_type: None,
            data: Bytes::from(data),
        });
    }

    let max_downloads = if args.unlimited {
        Some(None)
    } else {
        args.max_downloads.map(Some)
    };

    let created = service
        .create(CreateShareRequest {
            files,
            expiry_minutes: args.expiry,
            max_downloads,
        })
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "code": created.code,
            "display_name": created.display_name,
            "file_count": created.file_count,
            "total_size_bytes": created.total_size_bytes,
            "expires_at": created.expires_at,
            "expiry_minutes": created.expiry_minutes,
            "max_downloads": created.max_downloads,
            "bundled": created.bundled,
        })),
        OutputFormat::Text => {
            output::print_success(&format!("Share created: {}", created.code));
            output::print_kv("name", &created.display_name);
            output::print_kv("files", &created.file_count.to_string());
            output::print_kv("size", &output::human_size(created.total_size_bytes));
            output::print_kv("expires", &created.expires_at.to_rfc3339());
            match created.max_downloads {
                Some(n) => output::print_kv("downloads", &n.to_string()),
                None => output::print_kv("downloads", "unlimited"),
            }
            if created.bundled {
                output::print_warning("Files were stored as a single zip bundle");
            }
        }
    }
    Ok(())
}
