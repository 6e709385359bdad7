//! Document store abstraction traits
//!
//! This module defines the trait that store adapters must implement
//! to work with the sync pipeline.

use crate::domain::document::UpsertSpec;
use crate::domain::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A projected document returned as a flat map of dotted field paths.
///
/// Both fetch strategies consume this shape, so results are identical
/// regardless of how the query was issued.
pub type FlatDocument = serde_json::Map<String, Value>;

/// Result of an unordered bulk upsert
#[derive(Debug, Clone, Default)]
pub struct BulkWriteReport {
    /// Number of operations that matched an existing document
    pub matched: usize,

    /// Number of existing documents that were modified
    pub modified: usize,

    /// Number of documents inserted because no match existed
    pub upserted: usize,

    /// Details of failed operations
    pub failures: Vec<FailedUpsert>,
}

impl BulkWriteReport {
    /// Number of operations that completed successfully
    pub fn succeeded(&self) -> usize {
        self.modified + self.upserted
    }

    /// Merges counters from another report into this one
    pub fn merge(&mut self, other: BulkWriteReport) {
        self.matched += other.matched;
        self.modified += other.modified;
        self.upserted += other.upserted;
        self.failures.extend(other.failures);
    }
}

/// Details of a failed upsert operation
#[derive(Debug, Clone)]
pub struct FailedUpsert {
    /// Member ID the operation was keyed on
    pub member_id: String,

    /// Position of the operation within the submitted batch
    pub index: usize,

    /// Error message
    pub error: String,
}

/// Document store trait for the sync pipeline
///
/// Collections hold schemaless JSON documents. Queries address nested
/// fields with dotted paths (`"Member.Subscriber_ID"`), and projected
/// results come back as [`FlatDocument`] maps keyed by those same paths.
///
/// Bulk upserts are unordered: a failed operation never prevents later
/// operations in the same batch from being attempted.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Test the store connection
    ///
    /// # Errors
    ///
    /// Returns an error if the connection test fails.
    async fn test_connection(&self) -> Result<()>;

    /// Ensure the backing schema exists, creating it if necessary
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created or accessed.
    async fn ensure_schema(&self) -> Result<()>;

    /// Count the documents in a collection
    async fn count(&self, collection: &str) -> Result<u64>;

    /// Read an entire collection into memory
    ///
    /// Used by the materializing eligibility source and the crosswalk
    /// loader. Avoids long-lived server-side cursors entirely.
    async fn scan(&self, collection: &str) -> Result<Vec<Value>>;

    /// Read a window of a collection in a stable order
    ///
    /// # Arguments
    ///
    /// * `collection` - Collection to read
    /// * `skip` - Number of documents to skip
    /// * `limit` - Maximum number of documents to return
    async fn page(&self, collection: &str, skip: u64, limit: u64) -> Result<Vec<Value>>;

    /// Read a window of a collection, keeping only documents where every
    /// named array field is non-empty
    ///
    /// The window is applied after filtering, so pages stay full until
    /// the qualifying documents run out.
    async fn page_where_nonempty(
        &self,
        collection: &str,
        fields: &[&str],
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Value>>;

    /// Find documents where a field matches any of the given values
    ///
    /// # Arguments
    ///
    /// * `collection` - Collection to query
    /// * `field` - Dotted path of the field to match on
    /// * `values` - Set of values to match (set membership)
    /// * `projection` - Dotted paths to include in the result; the
    ///   match field itself is always included
    async fn find_in(
        &self,
        collection: &str,
        field: &str,
        values: &[Value],
        projection: &[&str],
    ) -> Result<Vec<FlatDocument>>;

    /// Find documents where a field equals a single value
    ///
    /// Delegates to [`find_in`](DocumentStore::find_in) so that single-member
    /// and batched queries return identical projections.
    async fn find_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        projection: &[&str],
    ) -> Result<Vec<FlatDocument>> {
        self.find_in(collection, field, std::slice::from_ref(value), projection)
            .await
    }

    /// Apply a batch of upserts without ordering guarantees
    ///
    /// Each operation is keyed on `memberId`. Set-on-insert fields are
    /// only written when the operation inserts a new document.
    ///
    /// # Arguments
    ///
    /// * `collection` - Destination collection
    /// * `ops` - Upsert operations to apply
    /// * `dry_run` - If true, validate and count but skip writes
    ///
    /// # Returns
    ///
    /// Returns a [`BulkWriteReport`] with matched/modified/upserted counts
    /// and per-operation failures. Operation-level failures are reported,
    /// not returned as an error; only a whole-batch failure (for example a
    /// lost connection) produces `Err`.
    async fn bulk_upsert(
        &self,
        collection: &str,
        ops: Vec<UpsertSpec>,
        dry_run: bool,
    ) -> Result<BulkWriteReport>;
}
