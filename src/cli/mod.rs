//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for claimsync using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Claimsync - Member claims synchronization pipeline
#[derive(Parser, Debug)]
#[command(name = "claimsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "claimsync.toml", env = "CLAIMSYNC_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CLAIMSYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize member claims into the staging collection
    Sync(commands::sync::SyncArgs),

    /// Run suspect inference over staged member documents
    Infer(commands::infer::InferArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show document counts for the configured collections
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_sync() {
        let cli = Cli::parse_from(["claimsync", "sync"]);
        assert_eq!(cli.config, "claimsync.toml");
        assert!(matches!(cli.command, Commands::Sync(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["claimsync", "--config", "custom.toml", "sync"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["claimsync", "--log-level", "debug", "infer"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_infer() {
        let cli = Cli::parse_from(["claimsync", "infer"]);
        assert!(matches!(cli.command, Commands::Infer(_)));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["claimsync", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["claimsync", "status"]);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["claimsync", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
