//! Eligibility records
//!
//! The eligibility collection is the source of truth for which members exist
//! in a run. Records are opaque attribute maps apart from the mandatory
//! `memberId` field; the pipeline never interprets the rest.

use crate::domain::ids::MemberId;
use crate::domain::{Result, SyncError};
use serde_json::Value;

/// An eligibility record read from the source collection
///
/// Wraps the raw JSON document and the validated member id extracted from it.
/// The raw document is embedded untransformed (after dot-key nesting) into
/// the staging document at merge time.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityRecord {
    member_id: MemberId,
    raw: Value,
}

impl EligibilityRecord {
    /// Build a record from a raw source document
    ///
    /// # Errors
    ///
    /// Returns a validation error if the document has no usable `memberId`.
    pub fn from_value(raw: Value) -> Result<Self> {
        let member_id = raw
            .get("memberId")
            .and_then(member_id_string)
            .ok_or_else(|| {
                SyncError::Validation("Eligibility record missing memberId".to_string())
            })?;

        let member_id = MemberId::new(member_id)
            .map_err(SyncError::Validation)?;

        Ok(Self { member_id, raw })
    }

    /// The member this record establishes eligibility for
    pub fn member_id(&self) -> &MemberId {
        &self.member_id
    }

    /// The raw source document
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Consumes self and returns the raw document
    pub fn into_raw(self) -> Value {
        self.raw
    }
}

/// Member ids arrive as strings or bare numbers depending on the feed;
/// normalize both to a string key.
fn member_id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
