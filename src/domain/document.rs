//! Staging document and upsert specifications
//!
//! `MemberClaimsDocument` is the only durable entity the pipeline produces:
//! one denormalized document per member, overwritten (not appended) on every
//! run. `UpsertSpec` is its write-side representation: a filter on `memberId`
//! plus set and set-on-insert field groups, so `createdAt` survives re-runs
//! while everything else is refreshed.

use crate::domain::claims::PharmacyClaim;
use crate::domain::ids::MemberId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The merged per-member staging document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberClaimsDocument {
    #[serde(rename = "memberId")]
    pub member_id: MemberId,

    /// The eligibility record, embedded untransformed apart from dot-key
    /// nesting
    pub eligibility: Value,

    /// Medical claims under the fixed projection, nested. Empty when none
    /// were found, never absent.
    #[serde(rename = "medicalClaims")]
    pub medical_claims: Vec<Value>,

    /// Normalized pharmacy claims. Empty when none were found, never absent.
    #[serde(rename = "pharmacyClaims")]
    pub pharmacy_claims: Vec<PharmacyClaim>,

    /// Set once on first insert, never overwritten
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Refreshed on every successful merge
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl MemberClaimsDocument {
    /// Split the document into its upsert specification
    ///
    /// `createdAt` and `memberId` go into the set-on-insert group; everything
    /// else is set unconditionally.
    pub fn into_upsert(self) -> UpsertSpec {
        let member_id = self.member_id.clone();
        UpsertSpec {
            member_id,
            set: json!({
                "eligibility": self.eligibility,
                "medicalClaims": self.medical_claims,
                "pharmacyClaims": self.pharmacy_claims,
                "updatedAt": self.updated_at,
            }),
            set_on_insert: json!({
                "memberId": self.member_id,
                "createdAt": self.created_at,
            }),
        }
    }
}

/// One idempotent upsert operation, keyed by member id
///
/// Executed as part of an unordered bulk write: a malformed spec fails alone
/// without blocking its siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertSpec {
    /// Filter key
    pub member_id: MemberId,

    /// Fields written on both insert and update
    pub set: Value,

    /// Fields written only when the document is first created
    pub set_on_insert: Value,
}

impl UpsertSpec {
    /// Validate the spec before execution
    ///
    /// Both field groups must be JSON objects; the store rejects anything
    /// else per-operation rather than failing the flush.
    pub fn validate(&self) -> Result<(), String> {
        if !self.set.is_object() {
            return Err(format!(
                "set fields for member {} must be an object",
                self.member_id
            ));
        }
        if !self.set_on_insert.is_object() {
            return Err(format!(
                "set-on-insert fields for member {} must be an object",
                self.member_id
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> MemberClaimsDocument {
        let now = Utc::now();
        MemberClaimsDocument {
            member_id: MemberId::new("M1001").unwrap(),
            eligibility: json!({"memberId": "M1001", "plan": {"code": "H1234"}}),
            medical_claims: vec![json!({"Claim": {"ClaimID": "C1"}})],
            pharmacy_claims: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_into_upsert_field_groups() {
        let doc = sample_document();
        let spec = doc.clone().into_upsert();

        assert_eq!(spec.member_id, doc.member_id);
        assert_eq!(spec.set["eligibility"], doc.eligibility);
        assert_eq!(spec.set["medicalClaims"], json!(doc.medical_claims));
        assert_eq!(spec.set["pharmacyClaims"], json!([]));
        assert!(spec.set.get("createdAt").is_none());

        assert_eq!(spec.set_on_insert["memberId"], "M1001");
        assert!(spec.set_on_insert.get("createdAt").is_some());
        assert!(spec.set_on_insert.get("updatedAt").is_none());
    }

    #[test]
    fn test_upsert_spec_validate_ok() {
        let spec = sample_document().into_upsert();
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_upsert_spec_validate_rejects_non_objects() {
        let mut spec = sample_document().into_upsert();
        spec.set = json!("not an object");
        assert!(spec.validate().is_err());

        let mut spec = sample_document().into_upsert();
        spec.set_on_insert = json!(42);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_document_serialization_keys() {
        let doc = sample_document();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["memberId"], "M1001");
        assert!(value["medicalClaims"].is_array());
        assert!(value["pharmacyClaims"].is_array());
        assert!(value["createdAt"].is_string());
        assert!(value["updatedAt"].is_string());
    }
}
