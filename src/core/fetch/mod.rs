//! Claims fetch strategies
//!
//! Each member in a batch needs its medical and pharmacy claims pulled
//! from the two source collections. Two interchangeable strategies
//! exist:
//!
//! - [`BatchedFetch`] issues one set-membership query per source per
//!   batch and groups the results by member.
//! - [`ConcurrentFetch`] runs one task per member on a bounded worker
//!   pool, with a join barrier before results are handed back.
//!
//! Both produce identical results for identical data: the same
//! projections are applied, remote documents pass through the same
//! dotted-path transform, and pharmacy rows go through the same
//! normalization.

pub mod batched;
pub mod concurrent;

pub use batched::BatchedFetch;
pub use concurrent::ConcurrentFetch;

use crate::adapters::store::{DocumentStore, FlatDocument};
use crate::config::{CollectionsConfig, FetchStrategyKind};
use crate::core::crosswalk::Crosswalk;
use crate::core::nest::nest;
use crate::domain::claims::PharmacyClaim;
use crate::domain::eligibility::EligibilityRecord;
use crate::domain::ids::MemberId;
use crate::domain::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Claims fetched for a single member
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberClaims {
    /// Medical claims, nested shape, source order
    pub medical: Vec<Value>,

    /// Pharmacy claims in canonical shape, source order
    pub pharmacy: Vec<PharmacyClaim>,
}

impl MemberClaims {
    /// Whether no claims of either kind were found
    pub fn is_empty(&self) -> bool {
        self.medical.is_empty() && self.pharmacy.is_empty()
    }
}

/// Outcome of fetching one member's claims
///
/// A member with no claims is a successful fetch of empty claims; a
/// failed query is distinct and never coerced into an empty result.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Queries succeeded; claims may be empty
    Fetched(MemberClaims),

    /// At least one source query failed for this member
    Failed(String),
}

/// Per-member fetch outcomes for one batch
pub type FetchMap = HashMap<MemberId, FetchOutcome>;

/// Strategy for fetching a batch of members' claims
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Fetch claims for every member in the batch
    ///
    /// Every input member gets an entry in the result map. The call as
    /// a whole only fails on errors that invalidate the entire batch;
    /// the orchestrator then fails all of the batch's members.
    async fn fetch_batch(
        &self,
        store: Arc<dyn DocumentStore>,
        crosswalk: &Crosswalk,
        members: &[EligibilityRecord],
    ) -> Result<FetchMap>;

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// Create the configured fetch strategy
pub fn create_strategy(
    kind: FetchStrategyKind,
    collections: &CollectionsConfig,
    max_concurrency: usize,
) -> Arc<dyn FetchStrategy> {
    match kind {
        FetchStrategyKind::Batched => Arc::new(BatchedFetch::new(
            collections.medical_claims.clone(),
            collections.pharmacy_claims.clone(),
        )),
        FetchStrategyKind::Concurrent => Arc::new(ConcurrentFetch::new(
            collections.medical_claims.clone(),
            collections.pharmacy_claims.clone(),
            max_concurrency,
        )),
    }
}

/// Stringify a matched field value the way the store compares it
pub(crate) fn match_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert a projected medical claim into its nested document shape
pub(crate) fn nest_medical(flat: &FlatDocument) -> Value {
    nest(flat)
}

/// Normalize a projected pharmacy row for a member
pub(crate) fn normalize_pharmacy(member_id: &MemberId, flat: &FlatDocument) -> PharmacyClaim {
    // Pharmacy source fields are top-level, so the flat map is already
    // the document shape the normalizer expects
    PharmacyClaim::normalize(member_id, &Value::Object(flat.clone()))
}
