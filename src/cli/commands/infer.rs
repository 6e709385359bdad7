//! Infer command implementation
//!
//! This module implements the `infer` command, which pages staged member
//! documents through the inference service and upserts suspect findings.

use crate::adapters::store::create_store;
use crate::config::load_config;
use crate::core::infer::InferCoordinator;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the infer command
#[derive(Args, Debug)]
pub struct InferArgs {
    /// Dry run mode - call the inference service but skip suspect writes
    #[arg(long)]
    pub dry_run: bool,

    /// Override inference page size
    #[arg(long)]
    pub batch_size: Option<usize>,
}

impl InferArgs {
    /// Execute the infer command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting infer command");

        let mut config = load_config(config_path)?;

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        if let Some(batch_size) = self.batch_size {
            tracing::info!(batch_size, "Overriding inference batch size from CLI");
            if let Some(ref mut inference) = config.inference {
                inference.batch_size = batch_size;
            }
        }

        if config.inference.is_none() {
            tracing::error!("Inference is not configured");
            eprintln!("The [inference] section is required for the infer command");
            return Ok(2); // Configuration error exit code
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        if config.application.dry_run {
            tracing::info!("Dry run mode enabled - no suspects will be written");
            println!("DRY RUN MODE - No suspects will be written to the store");
            println!();
        }

        let store = match create_store(&config.store).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to document store");
                eprintln!("Failed to connect to document store: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let mut coordinator = match InferCoordinator::new(config, store, shutdown_signal) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create inference coordinator");
                eprintln!("Failed to initialize inference: {e}");
                return Ok(2);
            }
        };

        tracing::info!("Executing inference run");
        println!("Starting inference...");
        println!();

        let summary = match coordinator.run().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Inference run failed");
                eprintln!("Inference run failed: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        println!();
        println!("Inference Summary:");
        println!("  Pages: {}", summary.pages);
        println!("  Documents: {}", summary.documents);
        println!("  Suspects: {}", summary.suspects);
        println!("  Persisted: {}", summary.persisted);
        println!("  Failed Pages: {}", summary.failed);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!();

        let exit_code = if summary.interrupted {
            println!("Inference interrupted gracefully.");
            tracing::info!("Inference interrupted by user signal");
            130 // SIGINT exit code (standard Unix convention)
        } else if summary.failed > 0 {
            println!("Inference completed with failed pages");
            1 // Partial success
        } else {
            println!("Inference completed successfully!");
            0
        };

        Ok(exit_code)
    }
}
