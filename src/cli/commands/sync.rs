//! Sync command implementation
//!
//! This module implements the `sync` command, which builds one staged
//! document per eligible member from the claims source collections.

use crate::adapters::store::create_store;
use crate::config::load_config;
use crate::config::schema::{FetchStrategyKind, SourceMode};
use crate::core::SyncCoordinator;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Dry run mode - simulate the sync without writing to the store
    #[arg(long)]
    pub dry_run: bool,

    /// Override eligibility batch size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override flush threshold
    #[arg(long)]
    pub flush_threshold: Option<usize>,

    /// Override fetch strategy (batched or concurrent)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Override eligibility source mode (materialize or paged)
    #[arg(long)]
    pub source_mode: Option<String>,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting sync command");

        // Load configuration
        let mut config = load_config(config_path)?;

        // Apply CLI overrides
        if let Some(batch_size) = self.batch_size {
            tracing::info!(batch_size, "Overriding batch size from CLI");
            config.sync.batch_size = batch_size;
        }

        if let Some(flush_threshold) = self.flush_threshold {
            tracing::info!(flush_threshold, "Overriding flush threshold from CLI");
            config.sync.flush_threshold = flush_threshold;
        }

        if let Some(ref strategy) = self.strategy {
            config.sync.fetch_strategy = match strategy.to_lowercase().as_str() {
                "batched" => FetchStrategyKind::Batched,
                "concurrent" => FetchStrategyKind::Concurrent,
                _ => {
                    tracing::error!(strategy = %strategy, "Invalid fetch strategy");
                    eprintln!("Invalid fetch strategy: {strategy}. Use 'batched' or 'concurrent'");
                    return Ok(2);
                }
            };
            tracing::info!(strategy = %strategy, "Overriding fetch strategy from CLI");
        }

        if let Some(ref mode) = self.source_mode {
            config.sync.source_mode = match mode.to_lowercase().as_str() {
                "materialize" => SourceMode::Materialize,
                "paged" => SourceMode::Paged,
                _ => {
                    tracing::error!(mode = %mode, "Invalid source mode");
                    eprintln!("Invalid source mode: {mode}. Use 'materialize' or 'paged'");
                    return Ok(2);
                }
            };
            tracing::info!(mode = %mode, "Overriding source mode from CLI");
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        // Validate configuration
        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2); // Configuration error exit code
        }

        if config.application.dry_run {
            tracing::info!("Dry run mode enabled - no data will be written");
            println!("DRY RUN MODE - No data will be written to the store");
            println!();
        }

        // Confirmation prompt (unless --yes or dry-run)
        if !self.yes && !config.application.dry_run {
            println!("Sync Configuration:");
            println!("  Eligibility: {}", config.collections.eligibility);
            println!("  Staging: {}", config.collections.staging);
            println!("  Batch size: {}", config.sync.batch_size);
            println!("  Flush threshold: {}", config.sync.flush_threshold);
            println!("  Fetch strategy: {:?}", config.sync.fetch_strategy);
            println!();
            print!("Proceed with sync? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Sync cancelled.");
                return Ok(0);
            }
        }

        // Connect to the document store
        let store = match create_store(&config.store).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to document store");
                eprintln!("Failed to connect to document store: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let mut coordinator = SyncCoordinator::new(config, store, shutdown_signal);

        tracing::info!("Executing sync");
        println!("Starting sync...");
        println!();

        let summary = match coordinator.run().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Sync failed");
                eprintln!("Sync failed: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        // Display summary
        println!();
        println!("Sync Summary:");
        println!("  Total Members: {}", summary.total_members);
        println!("  Fetched: {}", summary.fetched);
        println!("  Merged: {}", summary.merged);
        println!("  Persisted: {}", summary.persisted);
        println!("  Failed: {}", summary.failed_members);
        println!("  Skipped Source Rows: {}", summary.skipped_source_docs);
        println!("  Batches: {}", summary.batches);
        println!("  Flushes: {}", summary.flushes);
        println!(
            "  Upserted / Modified / Matched: {} / {} / {}",
            summary.upserted, summary.modified, summary.matched
        );
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!("  Persist Rate: {:.2}%", summary.persist_rate());
        println!();

        if !summary.errors.is_empty() {
            println!("Errors encountered:");
            for error in summary.errors.iter().take(10) {
                match &error.member_id {
                    Some(id) => println!("  - member {}: {}", id, error.message),
                    None => println!("  - {}", error.message),
                }
            }
            if summary.errors.len() > 10 {
                println!("  ... and {} more errors", summary.errors.len() - 10);
            }
            println!();
        }

        // Determine exit code
        let exit_code = if summary.interrupted {
            println!();
            println!("Sync interrupted gracefully. Flushed batches were persisted.");
            println!("Run the same command to rebuild the remaining members.");
            tracing::info!("Sync interrupted by user signal");
            130 // SIGINT exit code (standard Unix convention)
        } else if summary.is_successful() {
            println!("Sync completed successfully!");
            0
        } else {
            println!("Sync completed with failures");
            1 // Partial success
        };

        Ok(exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_args_defaults() {
        let args = SyncArgs {
            yes: false,
            dry_run: false,
            batch_size: None,
            flush_threshold: None,
            strategy: None,
            source_mode: None,
        };

        assert!(!args.yes);
        assert!(!args.dry_run);
        assert!(args.batch_size.is_none());
        assert!(args.strategy.is_none());
    }

    #[test]
    fn test_sync_args_with_overrides() {
        let args = SyncArgs {
            yes: true,
            dry_run: true,
            batch_size: Some(250),
            flush_threshold: Some(100),
            strategy: Some("concurrent".to_string()),
            source_mode: Some("paged".to_string()),
        };

        assert!(args.yes);
        assert!(args.dry_run);
        assert_eq!(args.batch_size, Some(250));
        assert_eq!(args.strategy.as_deref(), Some("concurrent"));
    }
}
