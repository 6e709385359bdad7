//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "claimsync.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("Initializing claimsync configuration");
        println!();

        // Check if file already exists
        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        // Generate configuration content
        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        // Write to file
        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set CLAIMSYNC_PG_CONNECTION");
                println!("     - Set CLAIMSYNC_INFERENCE_API_KEY (if using infer)");
                println!("  3. Validate configuration: claimsync validate-config");
                println!("  4. Run the pipeline: claimsync sync");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Claimsync Configuration File
# Member claims synchronization pipeline

environment = "development"

[application]
log_level = "info"
dry_run = false

[store]
connection_string = "${CLAIMSYNC_PG_CONNECTION}"

[collections]
eligibility = "hif.eligibility"
medical_claims = "claims.medical"
pharmacy_claims = "claims.pharmacy"
crosswalk = "hif.crosswalk"
staging = "staging.member_claims"

[sync]
batch_size = 100
flush_threshold = 50
fetch_strategy = "batched"
source_mode = "materialize"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Claimsync Configuration File
# Member claims synchronization pipeline
#
# Secrets are referenced as ${VAR} and resolved from the environment
# (a .env file is loaded at startup when present).

# Runtime environment: development | staging | production
environment = "development"

[application]
# Log level: trace | debug | info | warn | error
log_level = "info"
# Simulate the run without writing to the store
dry_run = false

[store]
# PostgreSQL connection string
connection_string = "${CLAIMSYNC_PG_CONNECTION}"
max_connections = 10
connection_timeout_seconds = 30
statement_timeout_seconds = 60

[collections]
eligibility = "hif.eligibility"
medical_claims = "claims.medical"
pharmacy_claims = "claims.pharmacy"
crosswalk = "hif.crosswalk"
staging = "staging.member_claims"
suspects = "ui.member.suspects"

[sync]
# Members per eligibility batch
batch_size = 100
# Staged upserts buffered before a bulk write
flush_threshold = 50
# Workers used by the concurrent strategy
max_concurrency = 8
# Fetch strategy: batched | concurrent
fetch_strategy = "batched"
# Eligibility paging: materialize | paged
source_mode = "materialize"
shutdown_timeout_secs = 30

[sync.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000

# Optional: required only for `claimsync infer`
[inference]
endpoint = "https://api.openai.com/v1"
api_key = "${CLAIMSYNC_INFERENCE_API_KEY}"
model = "gpt-4o-mini"
timeout_seconds = 60
# Staged documents per inference request
batch_size = 4

[logging]
# Write JSON logs to rotating local files in addition to the console
local_enabled = false
local_path = "/var/log/claimsync"
# Rotation: daily | hourly
local_rotation = "daily"
"#
        .to_string()
    }
}
