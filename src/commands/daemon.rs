//! Daemon command: run the scheduled cleanup sweep until interrupted.

use std::sync::Arc;

use clap::Args;
use tracing::{error, info};

use dropcode_core::config::AppConfig;
use dropcode_core::error::AppError;
use dropcode_core::events::ShareEvent;
use dropcode_worker::SweepScheduler;

use super::AppContext;

/// Arguments for the daemon command
#[derive(Debug, Args)]
pub struct DaemonArgs {
    /// Run one sweep immediately on startup
    #[arg(long)]
    pub sweep_on_start: bool,
}

/// Execute the daemon command
pub async fn execute(args: &DaemonArgs, config: AppConfig) -> Result<(), AppError> {
    if !config.worker.enabled {
        return Err(AppError::configuration(
            "Worker is disabled; set worker.enabled = true",
        ));
    }

    let ctx = AppContext::build(config).await?;
    let sweep = Arc::new(ctx.sweep_service());

    if args.sweep_on_start {
        let report = sweep.sweep().await?;
        info!(?report, "Startup sweep finished");
    }

    // Mirror domain events into the log while the daemon runs.
    let mut events = ctx.events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.payload {
                ShareEvent::Expired { code } => info!(code, "Share expired"),
                ShareEvent::Exhausted { code } => info!(code, "Share exhausted"),
                other => info!(event = ?other, "Share event"),
            }
        }
    });

    let mut scheduler = SweepScheduler::new(sweep).await?;
    scheduler.register(&ctx.config.worker.sweep_schedule).await?;
    scheduler.start().await?;

    info!(
        schedule = %ctx.config.worker.sweep_schedule,
        "Cleanup daemon running, press Ctrl-C to stop"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }

    info!("Shutting down");
    scheduler.shutdown().await?;
    Ok(())
}
