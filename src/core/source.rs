//! Eligibility source reader
//!
//! Streams the eligibility collection in fixed-size batches. Two modes
//! are supported:
//!
//! - `Materialize` reads the entire collection up front and chunks it
//!   in memory. Long runs then never depend on a live server-side
//!   cursor, which is what made the paged predecessor fail mid-run.
//! - `Paged` issues explicit skip/limit windows per batch.
//!
//! Documents without a usable `memberId` are counted and skipped, never
//! propagated as errors.

use crate::adapters::store::DocumentStore;
use crate::config::SourceMode;
use crate::domain::eligibility::EligibilityRecord;
use crate::domain::Result;
use std::sync::Arc;

/// Batched reader over the eligibility collection
pub struct EligibilitySource {
    store: Arc<dyn DocumentStore>,
    collection: String,
    batch_size: usize,
    mode: SourceMode,

    /// Remaining records when materialized (reversed for cheap pops)
    buffer: Option<Vec<EligibilityRecord>>,

    /// Next window offset when paging
    skip: u64,

    /// Documents skipped for lacking a member id
    skipped: usize,

    exhausted: bool,
}

impl EligibilitySource {
    /// Create a new source
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        batch_size: usize,
        mode: SourceMode,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            batch_size: batch_size.max(1),
            mode,
            buffer: None,
            skip: 0,
            skipped: 0,
            exhausted: false,
        }
    }

    /// Total number of source documents
    pub async fn total(&self) -> Result<u64> {
        self.store.count(&self.collection).await
    }

    /// Documents skipped so far for lacking a member id
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Fetch the next batch of eligibility records
    ///
    /// Returns `Ok(None)` once the source is exhausted. Batches are at
    /// most `batch_size` records; the final batch may be smaller.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<EligibilityRecord>>> {
        if self.exhausted {
            return Ok(None);
        }

        match self.mode {
            SourceMode::Materialize => self.next_materialized().await,
            SourceMode::Paged => self.next_page().await,
        }
    }

    async fn next_materialized(&mut self) -> Result<Option<Vec<EligibilityRecord>>> {
        if self.buffer.is_none() {
            let docs = self.store.scan(&self.collection).await?;
            tracing::info!(
                collection = %self.collection,
                documents = docs.len(),
                "Materialized eligibility source"
            );

            let mut records = self.parse(docs);
            // Reverse so batches pop off the tail in source order
            records.reverse();
            self.buffer = Some(records);
        }

        let buffer = match self.buffer.as_mut() {
            Some(buffer) => buffer,
            None => return Ok(None),
        };

        if buffer.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        let take = self.batch_size.min(buffer.len());
        let mut batch = Vec::with_capacity(take);
        for _ in 0..take {
            if let Some(record) = buffer.pop() {
                batch.push(record);
            }
        }

        Ok(Some(batch))
    }

    async fn next_page(&mut self) -> Result<Option<Vec<EligibilityRecord>>> {
        let docs = self
            .store
            .page(&self.collection, self.skip, self.batch_size as u64)
            .await?;

        if docs.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        self.skip += docs.len() as u64;
        let batch = self.parse(docs);

        if batch.is_empty() {
            // Whole window lacked member ids; keep paging
            return Box::pin(self.next_page()).await;
        }

        Ok(Some(batch))
    }

    fn parse(&mut self, docs: Vec<serde_json::Value>) -> Vec<EligibilityRecord> {
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            match EligibilityRecord::from_value(doc) {
                Ok(record) => records.push(record),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(error = %e, "Skipping eligibility document without memberId");
                }
            }
        }
        records
    }
}
