//! Sync pipeline orchestration
//!
//! - [`coordinator`] - batch streaming, fetch, merge, and flush loop
//! - [`flush`] - upsert buffering and retried bulk flushes
//! - [`summary`] - run counters and structured reporting

pub mod coordinator;
pub mod flush;
pub mod summary;

pub use coordinator::{LoopState, MemberState, SyncCoordinator};
pub use flush::{flush_with_retry, FlushBuffer};
pub use summary::{SyncIssue, SyncSummary};
