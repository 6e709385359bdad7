//! Member identifier crosswalk
//!
//! The medical-claims feed keys members by an external subscriber
//! identifier (MBI) rather than the internal member id. The crosswalk
//! collection maps one to the other; members without an entry fall back
//! to their own id so a missing row never drops a member.

use crate::adapters::store::DocumentStore;
use crate::domain::ids::{ExternalId, MemberId};
use crate::domain::Result;
use serde_json::Value;
use std::collections::HashMap;

/// In-memory MemberID → MBI mapping
///
/// Loaded once per run from the crosswalk collection. Rows missing
/// either side are skipped; a duplicate MemberID keeps the last row.
#[derive(Debug, Clone, Default)]
pub struct Crosswalk {
    map: HashMap<String, ExternalId>,
}

impl Crosswalk {
    /// Build a crosswalk from raw documents
    pub fn from_documents(docs: &[Value]) -> Self {
        let mut map = HashMap::new();

        for doc in docs {
            let member_id = doc.get("MemberID").and_then(value_as_id);
            let mbi = doc.get("MBI").and_then(value_as_id);

            match (member_id, mbi) {
                (Some(member_id), Some(mbi)) => {
                    if let Ok(external) = ExternalId::new(mbi) {
                        map.insert(member_id, external);
                    }
                }
                _ => {
                    tracing::debug!("Skipping crosswalk row without MemberID and MBI");
                }
            }
        }

        Self { map }
    }

    /// Load the crosswalk collection from the store
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read.
    pub async fn load(store: &dyn DocumentStore, collection: &str) -> Result<Self> {
        let docs = store.scan(collection).await?;
        let crosswalk = Self::from_documents(&docs);

        tracing::info!(
            collection = %collection,
            rows = docs.len(),
            entries = crosswalk.len(),
            "Crosswalk loaded"
        );

        Ok(crosswalk)
    }

    /// Resolve a member id to the external id used by the medical feed
    ///
    /// Falls back to the member's own id when no mapping exists.
    pub fn translate(&self, member_id: &MemberId) -> ExternalId {
        self.map
            .get(member_id.as_str())
            .cloned()
            .unwrap_or_else(|| ExternalId::from(member_id.clone()))
    }

    /// Number of mapped members
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the crosswalk has no entries
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Extracts an identifier as a string, accepting numeric source values
fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_translate_mapped_member() {
        let crosswalk = Crosswalk::from_documents(&[
            json!({"MemberID": "M1001", "MBI": "1EG4-TE5-MK73"}),
            json!({"MemberID": "M1002", "MBI": "2AB9-XY1-QP40"}),
        ]);

        assert_eq!(crosswalk.len(), 2);
        let external = crosswalk.translate(&MemberId::new("M1001").unwrap());
        assert_eq!(external.as_str(), "1EG4-TE5-MK73");
    }

    #[test]
    fn test_translate_falls_back_to_member_id() {
        let crosswalk = Crosswalk::from_documents(&[]);
        let external = crosswalk.translate(&MemberId::new("M9999").unwrap());
        assert_eq!(external.as_str(), "M9999");
    }

    #[test]
    fn test_rows_missing_either_side_are_skipped() {
        let crosswalk = Crosswalk::from_documents(&[
            json!({"MemberID": "M1", "MBI": null}),
            json!({"MBI": "1EG4"}),
            json!({"MemberID": "", "MBI": "1EG4"}),
            json!({"MemberID": "M2", "MBI": "2AB9"}),
        ]);

        assert_eq!(crosswalk.len(), 1);
        assert_eq!(
            crosswalk.translate(&MemberId::new("M2").unwrap()).as_str(),
            "2AB9"
        );
    }

    #[test]
    fn test_numeric_member_ids_are_stringified() {
        let crosswalk = Crosswalk::from_documents(&[json!({"MemberID": 1001, "MBI": "1EG4"})]);
        assert_eq!(
            crosswalk
                .translate(&MemberId::new("1001").unwrap())
                .as_str(),
            "1EG4"
        );
    }

    #[test]
    fn test_duplicate_member_id_keeps_last_row() {
        let crosswalk = Crosswalk::from_documents(&[
            json!({"MemberID": "M1", "MBI": "OLD"}),
            json!({"MemberID": "M1", "MBI": "NEW"}),
        ]);
        assert_eq!(
            crosswalk.translate(&MemberId::new("M1").unwrap()).as_str(),
            "NEW"
        );
    }

    #[tokio::test]
    async fn test_load_from_store() {
        use crate::adapters::store::MemoryStore;

        let store = MemoryStore::new();
        store.seed(
            "mbi_crosswalk",
            vec![json!({"MemberID": "M1", "MBI": "1EG4", "created_dt": "2024-01-01"})],
        );

        let crosswalk = Crosswalk::load(&store, "mbi_crosswalk").await.unwrap();
        assert_eq!(crosswalk.len(), 1);
    }
}
