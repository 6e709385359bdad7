//! Core pipeline logic for claimsync.
//!
//! This module contains the business logic of the claims sync,
//! independent of any concrete store or service backend:
//!
//! - [`crosswalk`] - member → external identifier resolution
//! - [`source`] - batched eligibility streaming
//! - [`fetch`] - claims fetch strategies (batched / concurrent)
//! - [`nest`] - bidirectional dotted-path transform
//! - [`merge`] - pure per-member document assembly
//! - [`sync`] - batch orchestration, flushing, summaries
//! - [`infer`] - suspect inference over staged documents

pub mod crosswalk;
pub mod fetch;
pub mod infer;
pub mod merge;
pub mod nest;
pub mod source;
pub mod sync;

pub use crosswalk::Crosswalk;
pub use source::EligibilitySource;
pub use sync::SyncCoordinator;
