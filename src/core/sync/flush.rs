//! Flush buffer for staged upserts
//!
//! Upserts accumulate across batches and are applied as unordered bulk
//! writes once the flush threshold is reached. The threshold is
//! deliberately independent of the fetch batch size.

use crate::adapters::store::{BulkWriteReport, DocumentStore};
use crate::config::RetryConfig;
use crate::domain::document::UpsertSpec;
use crate::domain::Result;
use std::time::Duration;

/// Accumulates upsert operations up to a flush threshold
pub struct FlushBuffer {
    ops: Vec<UpsertSpec>,
    threshold: usize,
}

impl FlushBuffer {
    /// Create a buffer that signals readiness at `threshold` operations
    pub fn new(threshold: usize) -> Self {
        Self {
            ops: Vec::with_capacity(threshold.max(1)),
            threshold: threshold.max(1),
        }
    }

    /// Queue an operation; returns true once the buffer should be flushed
    pub fn push(&mut self, op: UpsertSpec) -> bool {
        self.ops.push(op);
        self.ops.len() >= self.threshold
    }

    /// Number of queued operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Take all queued operations, leaving the buffer empty
    pub fn take(&mut self) -> Vec<UpsertSpec> {
        std::mem::take(&mut self.ops)
    }
}

/// Apply a bulk upsert with exponential backoff on whole-batch failures
///
/// Per-operation failures inside a successful call are final and come
/// back in the report; only whole-batch errors (connectivity, rejected
/// request) are retried.
///
/// # Errors
///
/// Returns the last error once retries are exhausted.
pub async fn flush_with_retry(
    store: &dyn DocumentStore,
    collection: &str,
    ops: Vec<UpsertSpec>,
    retry: &RetryConfig,
    dry_run: bool,
) -> Result<BulkWriteReport> {
    let mut attempt = 0;

    loop {
        match store.bulk_upsert(collection, ops.clone(), dry_run).await {
            Ok(report) => {
                tracing::info!(
                    collection = %collection,
                    submitted = ops.len(),
                    matched = report.matched,
                    modified = report.modified,
                    upserted = report.upserted,
                    failed = report.failures.len(),
                    "Flush applied"
                );
                return Ok(report);
            }
            Err(e) => {
                attempt += 1;
                if attempt > retry.max_retries {
                    return Err(e);
                }

                let delay_ms = retry
                    .initial_delay_ms
                    .saturating_mul(1u64 << (attempt - 1).min(16))
                    .min(retry.max_delay_ms);

                tracing::warn!(
                    attempt = attempt,
                    max_retries = retry.max_retries,
                    delay_ms = delay_ms,
                    error = %e,
                    "Retrying bulk flush after error"
                );

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::MemoryStore;
    use crate::domain::ids::MemberId;
    use serde_json::json;

    fn spec(member_id: &str) -> UpsertSpec {
        UpsertSpec {
            member_id: MemberId::new(member_id).unwrap(),
            set: json!({"updatedAt": "t"}),
            set_on_insert: json!({"memberId": member_id, "createdAt": "t"}),
        }
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay_ms: 1,
            max_delay_ms: 4,
        }
    }

    #[test]
    fn test_buffer_signals_at_threshold() {
        let mut buffer = FlushBuffer::new(3);
        assert!(!buffer.push(spec("M1")));
        assert!(!buffer.push(spec("M2")));
        assert!(buffer.push(spec("M3")));

        let drained = buffer.take();
        assert_eq!(drained.len(), 3);
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_flush_retries_then_succeeds() {
        let store = MemoryStore::new();
        store.fail_next_bulk(1);

        let report = flush_with_retry(&store, "staging", vec![spec("M1")], &fast_retry(), false)
            .await
            .unwrap();

        assert_eq!(report.upserted, 1);
        assert_eq!(store.bulk_call_count(), 2);
    }

    #[tokio::test]
    async fn test_flush_gives_up_after_max_retries() {
        let store = MemoryStore::new();
        store.fail_next_bulk(10);

        let result =
            flush_with_retry(&store, "staging", vec![spec("M1")], &fast_retry(), false).await;

        assert!(result.is_err());
        // Initial attempt plus max_retries
        assert_eq!(store.bulk_call_count(), 3);
    }
}
