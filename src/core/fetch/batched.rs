//! Batched fetch strategy
//!
//! One set-membership query per claim source per batch, grouped back to
//! members in memory. Minimizes round trips at the cost of failing the
//! whole batch when a source query fails.

use super::{
    match_key, nest_medical, normalize_pharmacy, FetchMap, FetchOutcome, FetchStrategy,
    MemberClaims,
};
use crate::adapters::store::DocumentStore;
use crate::core::crosswalk::Crosswalk;
use crate::domain::claims::{
    MEDICAL_MEMBER_FIELD, MEDICAL_PROJECTION, PHARMACY_MEMBER_FIELD, PHARMACY_PROJECTION,
};
use crate::domain::eligibility::EligibilityRecord;
use crate::domain::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Fetch strategy issuing one query per source per batch
pub struct BatchedFetch {
    medical_collection: String,
    pharmacy_collection: String,
}

impl BatchedFetch {
    /// Create a new batched strategy
    pub fn new(medical_collection: String, pharmacy_collection: String) -> Self {
        Self {
            medical_collection,
            pharmacy_collection,
        }
    }
}

#[async_trait]
impl FetchStrategy for BatchedFetch {
    async fn fetch_batch(
        &self,
        store: Arc<dyn DocumentStore>,
        crosswalk: &Crosswalk,
        members: &[EligibilityRecord],
    ) -> Result<FetchMap> {
        if members.is_empty() {
            return Ok(FetchMap::new());
        }

        // External id → members it resolves for. Identity fallback can
        // make two keys collide only if the feed reuses ids, in which
        // case each member still receives the matching claims.
        let mut by_external: HashMap<String, Vec<&EligibilityRecord>> = HashMap::new();
        let mut externals = Vec::with_capacity(members.len());
        let mut member_ids = Vec::with_capacity(members.len());

        for record in members {
            let external = crosswalk.translate(record.member_id());
            by_external
                .entry(external.as_str().to_string())
                .or_default()
                .push(record);
            externals.push(Value::String(external.into_inner()));
            member_ids.push(Value::String(record.member_id().as_str().to_string()));
        }

        let medical_docs = store
            .find_in(
                &self.medical_collection,
                MEDICAL_MEMBER_FIELD,
                &externals,
                MEDICAL_PROJECTION,
            )
            .await?;

        let pharmacy_docs = store
            .find_in(
                &self.pharmacy_collection,
                PHARMACY_MEMBER_FIELD,
                &member_ids,
                PHARMACY_PROJECTION,
            )
            .await?;

        let mut results: FetchMap = members
            .iter()
            .map(|record| {
                (
                    record.member_id().clone(),
                    FetchOutcome::Fetched(MemberClaims::default()),
                )
            })
            .collect();

        for flat in &medical_docs {
            let Some(key) = flat.get(MEDICAL_MEMBER_FIELD).map(match_key) else {
                continue;
            };
            let Some(owners) = by_external.get(&key) else {
                continue;
            };
            for record in owners {
                if let Some(FetchOutcome::Fetched(claims)) = results.get_mut(record.member_id()) {
                    claims.medical.push(nest_medical(flat));
                }
            }
        }

        for flat in &pharmacy_docs {
            let Some(key) = flat.get(PHARMACY_MEMBER_FIELD).map(match_key) else {
                continue;
            };
            let Some(member_id) = members
                .iter()
                .map(EligibilityRecord::member_id)
                .find(|id| id.as_str() == key)
            else {
                continue;
            };
            if let Some(FetchOutcome::Fetched(claims)) = results.get_mut(member_id) {
                claims.pharmacy.push(normalize_pharmacy(member_id, flat));
            }
        }

        tracing::debug!(
            members = members.len(),
            medical = medical_docs.len(),
            pharmacy = pharmacy_docs.len(),
            "Batched fetch complete"
        );

        Ok(results)
    }

    fn name(&self) -> &'static str {
        "batched"
    }
}
