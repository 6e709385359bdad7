//! In-memory document store
//!
//! Backs unit and pipeline tests with the same collection semantics as
//! the PostgreSQL store: dotted-path queries, flat projections, and
//! unordered keyed upserts. Failure injection knobs let tests exercise
//! per-operation failures and whole-flush errors.

use crate::adapters::store::traits::{BulkWriteReport, DocumentStore, FailedUpsert, FlatDocument};
use crate::core::nest::{flatten, project};
use crate::domain::document::UpsertSpec;
use crate::domain::errors::{StoreError, SyncError};
use crate::domain::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory document store
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,

    /// Member IDs whose upserts fail at the operation level
    fail_member_ids: Mutex<HashSet<String>>,

    /// Number of upcoming bulk_upsert calls that fail wholesale
    fail_next_bulk: AtomicUsize,

    /// Total bulk_upsert invocations (including failed ones)
    bulk_calls: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of a collection
    pub fn seed(&self, collection: &str, docs: Vec<Value>) {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(collection.to_string(), docs);
    }

    /// Snapshot the documents of a collection
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every upsert keyed on `member_id` fail at the operation level
    pub fn fail_upserts_for(&self, member_id: &str) {
        self.fail_member_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(member_id.to_string());
    }

    /// Make the next `n` bulk_upsert calls return a whole-batch error
    pub fn fail_next_bulk(&self, n: usize) {
        self.fail_next_bulk.store(n, Ordering::SeqCst);
    }

    /// Number of bulk_upsert calls observed so far
    pub fn bulk_call_count(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    fn stringify(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        Ok(self.documents(collection).len() as u64)
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Value>> {
        Ok(self.documents(collection))
    }

    async fn page(&self, collection: &str, skip: u64, limit: u64) -> Result<Vec<Value>> {
        Ok(self
            .documents(collection)
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn page_where_nonempty(
        &self,
        collection: &str,
        fields: &[&str],
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Value>> {
        Ok(self
            .documents(collection)
            .into_iter()
            .filter(|doc| {
                fields.iter().all(|field| {
                    doc.get(field)
                        .and_then(Value::as_array)
                        .is_some_and(|arr| !arr.is_empty())
                })
            })
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_in(
        &self,
        collection: &str,
        field: &str,
        values: &[Value],
        projection: &[&str],
    ) -> Result<Vec<FlatDocument>> {
        let wanted: HashSet<String> = values.iter().map(Self::stringify).collect();

        Ok(self
            .documents(collection)
            .iter()
            .filter_map(|doc| {
                let flat = flatten(doc);
                let matches = flat
                    .get(field)
                    .is_some_and(|v| wanted.contains(&Self::stringify(v)));
                matches.then(|| project(&flat, field, projection))
            })
            .collect())
    }

    async fn bulk_upsert(
        &self,
        collection: &str,
        ops: Vec<UpsertSpec>,
        dry_run: bool,
    ) -> Result<BulkWriteReport> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);

        if self
            .fail_next_bulk
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SyncError::Store(StoreError::BulkWriteFailed {
                collection: collection.to_string(),
                message: "injected bulk write failure".to_string(),
            }));
        }

        let mut report = BulkWriteReport::default();
        let failing = self
            .fail_member_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let docs = collections.entry(collection.to_string()).or_default();

        for (index, op) in ops.into_iter().enumerate() {
            let member_key = op.member_id.as_str().to_string();

            if let Err(e) = op.validate() {
                report.failures.push(FailedUpsert {
                    member_id: member_key,
                    index,
                    error: e,
                });
                continue;
            }

            if failing.contains(&member_key) {
                report.failures.push(FailedUpsert {
                    member_id: member_key,
                    index,
                    error: "injected operation failure".to_string(),
                });
                continue;
            }

            if dry_run {
                report.matched += 1;
                continue;
            }

            let existing = docs
                .iter_mut()
                .find(|doc| doc.get("memberId").map(Self::stringify).as_deref() == Some(&member_key));

            match existing {
                Some(doc) => {
                    let before = doc.clone();
                    if let (Value::Object(target), Value::Object(set)) = (&mut *doc, &op.set) {
                        for (key, value) in set {
                            target.insert(key.clone(), value.clone());
                        }
                    }
                    report.matched += 1;
                    if *doc != before {
                        report.modified += 1;
                    }
                }
                None => {
                    let mut fresh = serde_json::Map::new();
                    if let Value::Object(on_insert) = &op.set_on_insert {
                        for (key, value) in on_insert {
                            fresh.insert(key.clone(), value.clone());
                        }
                    }
                    if let Value::Object(set) = &op.set {
                        for (key, value) in set {
                            fresh.insert(key.clone(), value.clone());
                        }
                    }
                    docs.push(Value::Object(fresh));
                    report.upserted += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::MemberId;
    use serde_json::json;

    fn spec(member_id: &str, set: Value, set_on_insert: Value) -> UpsertSpec {
        UpsertSpec {
            member_id: MemberId::new(member_id).unwrap(),
            set,
            set_on_insert,
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let store = MemoryStore::new();

        let report = store
            .bulk_upsert(
                "staging",
                vec![spec(
                    "M1",
                    json!({"updatedAt": "t1", "medicalClaims": [1]}),
                    json!({"memberId": "M1", "createdAt": "t1"}),
                )],
                false,
            )
            .await
            .unwrap();
        assert_eq!(report.upserted, 1);
        assert_eq!(report.matched, 0);

        let report = store
            .bulk_upsert(
                "staging",
                vec![spec(
                    "M1",
                    json!({"updatedAt": "t2", "medicalClaims": [1, 2]}),
                    json!({"memberId": "M1", "createdAt": "t2"}),
                )],
                false,
            )
            .await
            .unwrap();
        assert_eq!(report.upserted, 0);
        assert_eq!(report.matched, 1);
        assert_eq!(report.modified, 1);

        let docs = store.documents("staging");
        assert_eq!(docs.len(), 1);
        // Set-on-insert fields keep their first-write values
        assert_eq!(docs[0]["createdAt"], "t1");
        assert_eq!(docs[0]["updatedAt"], "t2");
    }

    #[tokio::test]
    async fn test_upsert_unchanged_counts_matched_only() {
        let store = MemoryStore::new();
        let op = || {
            spec(
                "M1",
                json!({"updatedAt": "t1"}),
                json!({"memberId": "M1", "createdAt": "t1"}),
            )
        };

        store.bulk_upsert("staging", vec![op()], false).await.unwrap();
        let report = store.bulk_upsert("staging", vec![op()], false).await.unwrap();
        assert_eq!(report.matched, 1);
        assert_eq!(report.modified, 0);
    }

    #[tokio::test]
    async fn test_injected_op_failure_does_not_stop_batch() {
        let store = MemoryStore::new();
        store.fail_upserts_for("M2");

        let ops = vec![
            spec("M1", json!({"a": 1}), json!({"memberId": "M1"})),
            spec("M2", json!({"a": 2}), json!({"memberId": "M2"})),
            spec("M3", json!({"a": 3}), json!({"memberId": "M3"})),
        ];

        let report = store.bulk_upsert("staging", ops, false).await.unwrap();
        assert_eq!(report.upserted, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].member_id, "M2");
        assert_eq!(report.failures[0].index, 1);

        let docs = store.documents("staging");
        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn test_find_in_projects_flat_paths() {
        let store = MemoryStore::new();
        store.seed(
            "claims",
            vec![
                json!({"Member": {"Subscriber_ID": "S1"}, "Claim": {"ClaimID": "C1"}, "junk": 1}),
                json!({"Member": {"Subscriber_ID": "S2"}, "Claim": {"ClaimID": "C2"}}),
            ],
        );

        let found = store
            .find_in(
                "claims",
                "Member.Subscriber_ID",
                &[json!("S1")],
                &["Claim.ClaimID"],
            )
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("Claim.ClaimID"), Some(&json!("C1")));
        assert_eq!(found[0].get("Member.Subscriber_ID"), Some(&json!("S1")));
        assert!(!found[0].contains_key("junk"));
    }

    #[tokio::test]
    async fn test_find_in_matches_numeric_and_string_forms() {
        let store = MemoryStore::new();
        store.seed("pharmacy", vec![json!({"Member ID": 1001, "NDC": "n1"})]);

        let found = store
            .find_in("pharmacy", "Member ID", &[json!("1001")], &["NDC"])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_next_bulk() {
        let store = MemoryStore::new();
        store.fail_next_bulk(1);

        let ops = vec![spec("M1", json!({"a": 1}), json!({"memberId": "M1"}))];
        assert!(store.bulk_upsert("s", ops.clone(), false).await.is_err());
        assert!(store.bulk_upsert("s", ops, false).await.is_ok());
        assert_eq!(store.bulk_call_count(), 2);
    }

    #[tokio::test]
    async fn test_page_where_nonempty_requires_all_fields() {
        let store = MemoryStore::new();
        store.seed(
            "staging",
            vec![
                json!({"memberId": "M1", "medicalClaims": [], "pharmacyClaims": []}),
                json!({"memberId": "M2", "medicalClaims": [1], "pharmacyClaims": []}),
                json!({"memberId": "M3", "medicalClaims": [1], "pharmacyClaims": [2]}),
            ],
        );

        let page = store
            .page_where_nonempty("staging", &["medicalClaims", "pharmacyClaims"], 0, 10)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["memberId"], "M3");
    }
}
