//! Concurrent fetch strategy
//!
//! One task per member on a bounded worker pool. Queries for different
//! members overlap, but the batch only completes after every task has
//! joined, so downstream code never observes a partially fetched batch.
//! A failed member never poisons its siblings.

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
use crate::domain::ids::MemberId;
use crate::domain::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Fetch strategy running one bounded task per member
pub struct ConcurrentFetch {
    medical_collection: String,
    pharmacy_collection: String,
    max_concurrency: usize,
}

impl ConcurrentFetch {
    /// Create a new concurrent strategy
    pub fn new(
        medical_collection: String,
        pharmacy_collection: String,
        max_concurrency: usize,
    ) -> Self {
        Self {
            medical_collection,
            pharmacy_collection,
            max_concurrency: max_concurrency.max(1),
        }
    }
}

async fn fetch_one(
    store: Arc<dyn DocumentStore>,
    medical_collection: String,
    pharmacy_collection: String,
    member_id: MemberId,
    external: String,
) -> FetchOutcome {
    let external_value = Value::String(external);
    let member_value = Value::String(member_id.as_str().to_string());

    // The two sources are independent; query them in parallel
    let (medical, pharmacy) = futures::join!(
        store.find_eq(
            &medical_collection,
            MEDICAL_MEMBER_FIELD,
            &external_value,
            MEDICAL_PROJECTION,
        ),
        store.find_eq(
            &pharmacy_collection,
            PHARMACY_MEMBER_FIELD,
            &member_value,
            PHARMACY_PROJECTION,
        )
    );

    match (medical, pharmacy) {
        (Ok(medical), Ok(pharmacy)) => {
            let claims = MemberClaims {
                medical: medical.iter().map(nest_medical).collect(),
                pharmacy: pharmacy
                    .iter()
                    .filter(|flat| {
                        flat.get(PHARMACY_MEMBER_FIELD)
                            .is_some_and(|v| match_key(v) == member_id.as_str())
                    })
                    .map(|flat| normalize_pharmacy(&member_id, flat))
                    .collect(),
            };
            FetchOutcome::Fetched(claims)
        }
        (Err(e), _) | (_, Err(e)) => FetchOutcome::Failed(e.to_string()),
    }
}

#[async_trait]
impl FetchStrategy for ConcurrentFetch {
    async fn fetch_batch(
        &self,
        store: Arc<dyn DocumentStore>,
        crosswalk: &Crosswalk,
        members: &[EligibilityRecord],
    ) -> Result<FetchMap> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for record in members {
            let member_id = record.member_id().clone();
            let external = crosswalk.translate(&member_id).into_inner();
            let store = Arc::clone(&store);
            let semaphore = Arc::clone(&semaphore);
            let medical_collection = self.medical_collection.clone();
            let pharmacy_collection = self.pharmacy_collection.clone();

            tasks.spawn(async move {
                // Closed only when the JoinSet is dropped mid-flight
                let _permit = semaphore.acquire_owned().await;
                let outcome = fetch_one(
                    store,
                    medical_collection,
                    pharmacy_collection,
                    member_id.clone(),
                    external,
                )
                .await;
                (member_id, outcome)
            });
        }

        // Join barrier: the batch result is only assembled once every
        // worker has finished.
        let mut results = FetchMap::with_capacity(members.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((member_id, outcome)) => {
                    results.insert(member_id, outcome);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Fetch worker panicked");
                }
            }
        }

        // A panicked worker leaves its member without an entry; record
        // it as failed so the member is never silently dropped.
        for record in members {
            results
                .entry(record.member_id().clone())
                .or_insert_with(|| FetchOutcome::Failed("fetch worker panicked".to_string()));
        }

        tracing::debug!(
            members = members.len(),
            concurrency = self.max_concurrency,
            "Concurrent fetch complete"
        );

        Ok(results)
    }

    fn name(&self) -> &'static str {
        "concurrent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::MemoryStore;
    use serde_json::json;

    fn record(member_id: &str) -> EligibilityRecord {
        EligibilityRecord::from_value(json!({"memberId": member_id})).unwrap()
    }

    #[tokio::test]
    async fn test_fetches_all_members() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "edps_claims",
            vec![json!({"Member": {"Subscriber_ID": "1EG4"}, "Claim": {"ClaimID": "C1"}})],
        );
        store.seed(
            "pharmacy_claims",
            vec![json!({"Member ID": "M2", "NDC": "55154-5057-10"})],
        );

        let crosswalk = Crosswalk::from_documents(&[json!({"MemberID": "M1", "MBI": "1EG4"})]);
        let strategy = ConcurrentFetch::new(
            "edps_claims".to_string(),
            "pharmacy_claims".to_string(),
            4,
        );

        let results = strategy
            .fetch_batch(store, &crosswalk, &[record("M1"), record("M2")])
            .await
            .unwrap();

        let m1 = &results[&MemberId::new("M1").unwrap()];
        let m2 = &results[&MemberId::new("M2").unwrap()];

        match m1 {
            FetchOutcome::Fetched(claims) => {
                assert_eq!(claims.medical.len(), 1);
                assert!(claims.pharmacy.is_empty());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        match m2 {
            FetchOutcome::Fetched(claims) => {
                assert!(claims.medical.is_empty());
                assert_eq!(claims.pharmacy.len(), 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_matches_batched_strategy() {
        use crate::core::fetch::BatchedFetch;

        let store = Arc::new(MemoryStore::new());
        store.seed(
            "edps_claims",
            vec![
                json!({"Member": {"Subscriber_ID": "1EG4"}, "Claim": {"ClaimID": "C1"}, "Type_of_Bill": "0111"}),
                json!({"Member": {"Subscriber_ID": "M2"}, "Claim": {"ClaimID": "C2"}}),
            ],
        );
        store.seed(
            "pharmacy_claims",
            vec![
                json!({"Member ID": "M1", "NDC": "0002-1433-80", "Fill Date": "2024-03-15"}),
                json!({"Member ID": "M2", "NDC": "55154-5057-10"}),
            ],
        );

        let crosswalk = Crosswalk::from_documents(&[json!({"MemberID": "M1", "MBI": "1EG4"})]);
        let members = [record("M1"), record("M2"), record("M3")];

        let batched = BatchedFetch::new("edps_claims".to_string(), "pharmacy_claims".to_string())
            .fetch_batch(Arc::clone(&store) as Arc<dyn DocumentStore>, &crosswalk, &members)
            .await
            .unwrap();
        let concurrent = ConcurrentFetch::new(
            "edps_claims".to_string(),
            "pharmacy_claims".to_string(),
            2,
        )
        .fetch_batch(store, &crosswalk, &members)
        .await
        .unwrap();

        assert_eq!(batched, concurrent);
    }
}
