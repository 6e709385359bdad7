// Claimsync - Member Claims Synchronization Pipeline
// Copyright (c) 2025 Claimsync Contributors
// Licensed under the MIT License

//! # Claimsync - Member Claims Synchronization
//!
//! Claimsync builds one consolidated claims document per eligible member.
//! It streams an eligibility roster in batches, resolves each member's
//! external claims identifier through a crosswalk, fetches that member's
//! medical and pharmacy claims, and upserts the merged result into a
//! staging collection keyed by member id.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Streaming** eligibility rosters in fixed-size batches
//! - **Resolving** member ids to external claims identifiers via a crosswalk
//! - **Fetching** medical and pharmacy claims with batched or concurrent strategies
//! - **Merging** claims into per-member staging documents
//! - **Upserting** documents idempotently with insert-only and always-set fields
//! - **Inferring** clinical suspects from staged documents via an LLM service
//!
//! ## Architecture
//!
//! Claimsync follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (crosswalk, fetch, merge, sync, infer)
//! - [`adapters`] - External integrations (document store, inference service)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use claimsync::adapters::store::create_store;
//! use claimsync::config::load_config;
//! use claimsync::core::SyncCoordinator;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("claimsync.toml")?;
//!     let store = create_store(&config.store).await?;
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     let mut coordinator = SyncCoordinator::new(config, store, shutdown_rx);
//!     let summary = coordinator.run().await?;
//!
//!     println!("Persisted {} member documents", summary.persisted);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Claimsync uses the [`domain::SyncError`] type for all errors:
//!
//! ```rust,no_run
//! use claimsync::domain::SyncError;
//!
//! fn example() -> Result<(), SyncError> {
//!     let config = claimsync::config::load_config("claimsync.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Claimsync uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn, error};
//!
//! info!("Starting sync");
//! warn!(member_id = "10001", "Crosswalk entry missing, using member id");
//! error!(error = "timeout", "Bulk write failed");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
