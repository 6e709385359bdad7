//! Status command implementation
//!
//! This module implements the `status` command, which reports document
//! counts for the configured collections.

use crate::adapters::store::create_store;
use crate::config::load_config;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking collection status");

        println!("Collection Status");
        println!();

        // Load configuration
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        // Connect to the document store
        let store = match create_store(&config.store).await {
            Ok(s) => s,
            Err(e) => {
                println!("Failed to connect to document store");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        if let Err(e) = store.test_connection().await {
            println!("Document store is unreachable");
            println!("   Error: {e}");
            return Ok(4);
        }

        let collections = [
            ("Eligibility", &config.collections.eligibility),
            ("Medical Claims", &config.collections.medical_claims),
            ("Pharmacy Claims", &config.collections.pharmacy_claims),
            ("Crosswalk", &config.collections.crosswalk),
            ("Staging", &config.collections.staging),
            ("Suspects", &config.collections.suspects),
        ];

        for (label, collection) in collections {
            match store.count(collection).await {
                Ok(count) => println!("  {label:<16} {collection:<32} {count} documents"),
                Err(e) => {
                    println!("Failed to count {collection}");
                    println!("   Error: {e}");
                    return Ok(5); // Fatal error exit code
                }
            }
        }

        println!();
        Ok(0)
    }
}
