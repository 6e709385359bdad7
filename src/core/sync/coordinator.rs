//! Sync coordinator - main orchestrator for the claims pipeline
//!
//! Streams the eligibility collection in batches, fetches and merges
//! each member's claims, and applies the staged upserts through the
//! flush buffer. Shutdown is cooperative: the signal is checked at
//! batch boundaries, the in-flight batch completes, the partial buffer
//! is flushed, and the summary reports the run as interrupted.

use crate::adapters::store::DocumentStore;
use crate::config::ClaimsyncConfig;
use crate::core::crosswalk::Crosswalk;
use crate::core::fetch::{create_strategy, FetchMap, FetchOutcome, FetchStrategy};
use crate::core::merge::merge_member;
use crate::core::source::EligibilitySource;
use crate::domain::eligibility::EligibilityRecord;
use crate::core::sync::flush::{flush_with_retry, FlushBuffer};
use crate::core::sync::summary::{SyncIssue, SyncSummary};
use crate::domain::Result;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Lifecycle of a single member within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberState {
    /// Streamed from the source, not yet fetched
    Pending,
    /// Claim queries in flight
    Fetching,
    /// Staging document assembled
    Merged,
    /// Upsert queued in the flush buffer
    Queued,
    /// Upsert applied (inserted, modified, or already current)
    Persisted,
    /// Terminally failed; logged and excluded from the flush
    Failed,
}

impl MemberState {
    /// Whether `next` is a legal successor of this state
    pub fn can_advance_to(self, next: MemberState) -> bool {
        use MemberState::*;
        matches!(
            (self, next),
            (Pending, Fetching)
                | (Fetching, Merged)
                | (Fetching, Failed)
                | (Merged, Queued)
                | (Queued, Persisted)
                | (Queued, Failed)
        )
    }

    /// Whether the state is terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, MemberState::Persisted | MemberState::Failed)
    }
}

/// Lifecycle of the streaming loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting on the next source batch
    Streaming,
    /// A batch is being fetched and merged
    BatchReady,
    /// The flush buffer is being applied
    Flushing,
    /// The source is exhausted or shutdown was requested
    Done,
}

/// Sync coordinator
pub struct SyncCoordinator {
    config: ClaimsyncConfig,
    store: Arc<dyn DocumentStore>,
    strategy: Arc<dyn FetchStrategy>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SyncCoordinator {
    /// Create a new coordinator
    pub fn new(
        config: ClaimsyncConfig,
        store: Arc<dyn DocumentStore>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let strategy = create_strategy(
            config.sync.fetch_strategy,
            &config.collections,
            config.sync.max_concurrency,
        );

        Self {
            config,
            store,
            strategy,
            shutdown_rx,
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Execute the sync
    ///
    /// This is the main entry point for the pipeline. It:
    /// 1. Verifies store connectivity (run-fatal on failure)
    /// 2. Loads the identifier crosswalk (run-fatal on failure)
    /// 3. Streams eligibility batches, fetching and merging claims
    /// 4. Flushes staged upserts at the flush threshold
    /// 5. Flushes the partial buffer and reports a summary
    ///
    /// Per-member failures are contained: they are logged, counted, and
    /// excluded from the flush without stopping the run.
    pub async fn run(&mut self) -> Result<SyncSummary> {
        let start_time = Instant::now();
        let mut summary = SyncSummary::new();
        let dry_run = self.config.application.dry_run;

        tracing::info!(
            run_id = %summary.run_id,
            strategy = self.strategy.name(),
            batch_size = self.config.sync.batch_size,
            flush_threshold = self.config.sync.flush_threshold,
            dry_run = dry_run,
            "Starting claims sync"
        );

        self.store.test_connection().await?;

        let crosswalk =
            Crosswalk::load(self.store.as_ref(), &self.config.collections.crosswalk).await?;

        let mut source = EligibilitySource::new(
            Arc::clone(&self.store),
            self.config.collections.eligibility.clone(),
            self.config.sync.batch_size,
            self.config.sync.source_mode,
        );

        let total = source.total().await?;
        tracing::info!(source_documents = total, "Eligibility source ready");

        let mut buffer = FlushBuffer::new(self.config.sync.flush_threshold);
        let mut loop_state = LoopState::Streaming;

        // The in-flight batch: members not yet processed and their fetch
        // outcomes. Non-empty only between Streaming and the end of the
        // batch, surviving mid-batch trips through Flushing.
        let mut pending: VecDeque<EligibilityRecord> = VecDeque::new();
        let mut outcomes = FetchMap::new();
        let mut batch_time: DateTime<Utc> = Utc::now();

        while loop_state != LoopState::Done {
            loop_state = match loop_state {
                LoopState::Streaming => {
                    if self.shutdown_requested() {
                        tracing::info!("Shutdown requested, stopping before next batch");
                        summary.interrupted = true;
                        LoopState::Done
                    } else {
                        match source.next_batch().await? {
                            None => LoopState::Done,
                            Some(batch) => {
                                summary.batches += 1;
                                summary.total_members += batch.len();

                                match self
                                    .strategy
                                    .fetch_batch(Arc::clone(&self.store), &crosswalk, &batch)
                                    .await
                                {
                                    Ok(fetched) => {
                                        outcomes = fetched;
                                        pending = batch.into();
                                        batch_time = Utc::now();
                                        LoopState::BatchReady
                                    }
                                    Err(e) => {
                                        // A whole-batch fetch failure fails
                                        // every member in the batch; the run
                                        // continues with the next one.
                                        tracing::error!(
                                            error = %e,
                                            members = batch.len(),
                                            "Batch fetch failed"
                                        );
                                        for record in &batch {
                                            summary.add_member_error(
                                                record.member_id().as_str(),
                                                format!("batch fetch failed: {e}"),
                                            );
                                        }
                                        LoopState::Streaming
                                    }
                                }
                            }
                        }
                    }
                }

                LoopState::BatchReady => {
                    let mut next = LoopState::Streaming;
                    while let Some(record) = pending.pop_front() {
                        let member_id = record.member_id().clone();
                        match outcomes.get(&member_id) {
                            Some(FetchOutcome::Fetched(claims)) => {
                                summary.fetched += 1;
                                let doc = merge_member(
                                    record,
                                    claims.medical.clone(),
                                    claims.pharmacy.clone(),
                                    batch_time,
                                );
                                summary.merged += 1;

                                if buffer.push(doc.into_upsert()) {
                                    next = LoopState::Flushing;
                                    break;
                                }
                            }
                            Some(FetchOutcome::Failed(message)) => {
                                tracing::warn!(
                                    member_id = %member_id,
                                    error = %message,
                                    "Member fetch failed"
                                );
                                summary.add_member_error(member_id.as_str(), message.clone());
                            }
                            None => {
                                summary
                                    .add_member_error(member_id.as_str(), "missing fetch outcome");
                            }
                        }
                    }
                    next
                }

                LoopState::Flushing => {
                    self.flush(&mut buffer, &mut summary, dry_run).await;
                    if pending.is_empty() {
                        LoopState::Streaming
                    } else {
                        LoopState::BatchReady
                    }
                }

                LoopState::Done => LoopState::Done,
            };
        }

        // Flush whatever is left, including a partial buffer after an
        // interrupt, so completed work is never discarded.
        if !buffer.is_empty() {
            self.flush(&mut buffer, &mut summary, dry_run).await;
        }

        summary.skipped_source_docs = source.skipped();
        let mut summary = summary.with_duration(start_time.elapsed());

        if summary.interrupted {
            summary
                .errors
                .push(SyncIssue::run("run interrupted by shutdown signal"));
        }

        summary.log_summary();
        Ok(summary)
    }

    /// Apply the buffered upserts as one bulk group
    ///
    /// A group whose retries are exhausted fails alone: its members are
    /// recorded as failed and the run moves on to the next batch.
    async fn flush(&self, buffer: &mut FlushBuffer, summary: &mut SyncSummary, dry_run: bool) {
        let ops = buffer.take();
        if ops.is_empty() {
            return;
        }

        let submitted = ops.len();
        let members: Vec<String> = ops
            .iter()
            .map(|op| op.member_id.as_str().to_string())
            .collect();

        match flush_with_retry(
            self.store.as_ref(),
            &self.config.collections.staging,
            ops,
            &self.config.sync.retry,
            dry_run,
        )
        .await
        {
            Ok(report) => summary.record_flush(submitted, &report),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    members = submitted,
                    "Bulk flush failed after retries, skipping group"
                );
                for member in &members {
                    summary.add_member_error(member, format!("bulk flush failed: {e}"));
                }
            }
        }
    }
}
