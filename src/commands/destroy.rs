//! Destroy command: remove a share before it expires.

use clap::Args;
use dialoguer::Confirm;

use dropcode_core::config::AppConfig;
use dropcode_core::error::AppError;
use dropcode_core::types::ShareCode;

use crate::output;

use super::AppContext;

/// Arguments for the destroy command
#[derive(Debug, Args)]
pub struct DestroyArgs {
    /// The share code to destroy
    pub code: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the destroy command
pub async fn execute(args: &DestroyArgs, config: AppConfig) -> Result<(), AppError> {
    let code = ShareCode::parse(&args.code)?;

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Destroy share {code} and delete its files?"))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Prompt failed: {e}")))?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let ctx = AppContext::build(config).await?;
    ctx.share_service().destroy(&code).await?;
    output::print_success(&format!("Destroyed share {code}"));
    Ok(())
}
