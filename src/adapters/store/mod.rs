//! Document store abstraction layer
//!
//! This module provides a trait-based abstraction for collection
//! operations, with a PostgreSQL JSONB backend for production and an
//! in-memory backend for tests.

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use traits::{BulkWriteReport, DocumentStore, FailedUpsert, FlatDocument};

use crate::config::StoreConfig;
use crate::domain::Result;
use std::sync::Arc;

/// Create the configured document store
///
/// # Errors
///
/// Returns an error if the store cannot be initialized.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    let store = PostgresStore::new(config.clone()).await?;
    store.ensure_schema().await?;
    Ok(Arc::new(store))
}
