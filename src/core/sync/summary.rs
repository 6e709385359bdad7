//! Sync summary and reporting
//!
//! This module defines structures for tracking and reporting the
//! outcome of a sync run.

use crate::adapters::store::BulkWriteReport;
use std::time::Duration;
use uuid::Uuid;

/// A contained problem recorded during a run
#[derive(Debug, Clone)]
pub struct SyncIssue {
    /// Member the issue is scoped to, if any
    pub member_id: Option<String>,

    /// What went wrong
    pub message: String,
}

impl SyncIssue {
    /// Issue scoped to a single member
    pub fn member(member_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            member_id: Some(member_id.into()),
            message: message.into(),
        }
    }

    /// Issue not tied to a member
    pub fn run(message: impl Into<String>) -> Self {
        Self {
            member_id: None,
            message: message.into(),
        }
    }
}

/// Summary of a sync run
#[derive(Debug, Clone)]
pub struct SyncSummary {
    /// Run identifier for log correlation
    pub run_id: Uuid,

    /// Members streamed from the eligibility source
    pub total_members: usize,

    /// Members whose claims were fetched successfully
    pub fetched: usize,

    /// Members merged into a staging document
    pub merged: usize,

    /// Members whose upsert was applied (inserted, modified, or already current)
    pub persisted: usize,

    /// Members that terminally failed during the run
    pub failed_members: usize,

    /// Source documents skipped for lacking a member id
    pub skipped_source_docs: usize,

    /// Batches streamed from the source
    pub batches: usize,

    /// Bulk flushes applied
    pub flushes: usize,

    /// Upserts that matched an existing document
    pub matched: usize,

    /// Upserts that modified an existing document
    pub modified: usize,

    /// Upserts that inserted a new document
    pub upserted: usize,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Whether the run stopped early on a shutdown signal
    pub interrupted: bool,

    /// Contained problems recorded during the run
    pub errors: Vec<SyncIssue>,
}

impl SyncSummary {
    /// Create a new empty summary
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            total_members: 0,
            fetched: 0,
            merged: 0,
            persisted: 0,
            failed_members: 0,
            skipped_source_docs: 0,
            batches: 0,
            flushes: 0,
            matched: 0,
            modified: 0,
            upserted: 0,
            duration: Duration::from_secs(0),
            interrupted: false,
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a member-scoped failure
    pub fn add_member_error(&mut self, member_id: &str, message: impl Into<String>) {
        self.failed_members += 1;
        self.errors.push(SyncIssue::member(member_id, message));
    }

    /// Fold a flush report into the counters
    pub fn record_flush(&mut self, submitted: usize, report: &BulkWriteReport) {
        self.flushes += 1;
        self.matched += report.matched;
        self.modified += report.modified;
        self.upserted += report.upserted;
        self.persisted += submitted - report.failures.len();

        for failure in &report.failures {
            self.failed_members += 1;
            self.errors.push(SyncIssue::member(
                failure.member_id.clone(),
                format!("upsert failed: {}", failure.error),
            ));
        }
    }

    /// Check if the run completed without failures
    pub fn is_successful(&self) -> bool {
        self.failed_members == 0 && self.errors.is_empty() && !self.interrupted
    }

    /// Percentage of streamed members that were persisted
    pub fn persist_rate(&self) -> f64 {
        if self.total_members == 0 {
            return 100.0;
        }
        (self.persisted as f64 / self.total_members as f64) * 100.0
    }

    /// Log the summary at the appropriate level
    pub fn log_summary(&self) {
        if self.is_successful() {
            tracing::info!(
                run_id = %self.run_id,
                total_members = self.total_members,
                fetched = self.fetched,
                merged = self.merged,
                persisted = self.persisted,
                batches = self.batches,
                flushes = self.flushes,
                matched = self.matched,
                modified = self.modified,
                upserted = self.upserted,
                skipped_source_docs = self.skipped_source_docs,
                duration_secs = self.duration.as_secs_f64(),
                "Sync completed successfully"
            );
        } else {
            tracing::warn!(
                run_id = %self.run_id,
                total_members = self.total_members,
                persisted = self.persisted,
                failed_members = self.failed_members,
                errors = self.errors.len(),
                interrupted = self.interrupted,
                persist_rate = format!("{:.2}%", self.persist_rate()),
                duration_secs = self.duration.as_secs_f64(),
                "Sync completed with failures"
            );

            for issue in self.errors.iter().take(20) {
                tracing::warn!(
                    member_id = issue.member_id.as_deref().unwrap_or("-"),
                    message = %issue.message,
                    "Sync issue"
                );
            }
        }
    }
}

impl Default for SyncSummary {
    fn default() -> Self {
        Self::new()
    }
}
