//! Member document merge
//!
//! Pure assembly of one staging document per member from eligibility
//! and fetched claims. No I/O happens here; both fetch strategies feed
//! the same function so their outputs are indistinguishable downstream.

use crate::core::nest::{flatten, nest};
use crate::domain::claims::PharmacyClaim;
use crate::domain::document::MemberClaimsDocument;
use crate::domain::eligibility::EligibilityRecord;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Merge one member's eligibility and claims into a staging document
///
/// Dotted keys anywhere in the eligibility document are normalized into
/// nested objects. Claims arrive already nested and are carried as-is;
/// members with no claims produce a document with empty arrays, which
/// is a valid outcome, not an error.
pub fn merge_member(
    record: EligibilityRecord,
    medical_claims: Vec<Value>,
    pharmacy_claims: Vec<PharmacyClaim>,
    now: DateTime<Utc>,
) -> MemberClaimsDocument {
    let member_id = record.member_id().clone();
    let eligibility = nest(&flatten(&record.into_raw()));

    MemberClaimsDocument {
        member_id,
        eligibility,
        medical_claims,
        pharmacy_claims,
        created_at: now,
        updated_at: now,
    }
}
