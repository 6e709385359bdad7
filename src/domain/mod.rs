//! Domain models and types for claimsync.
//!
//! This module contains the core domain models, types, and business rules.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`MemberId`], [`ExternalId`])
//! - **Source records** ([`EligibilityRecord`], [`PharmacyClaim`])
//! - **The staging document** ([`MemberClaimsDocument`], [`UpsertSpec`])
//! - **Inference output** ([`Suspect`])
//! - **Error types** ([`SyncError`], [`StoreError`], [`InferenceError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type safety
//!
//! The two identifier spaces the pipeline reconciles are distinct newtypes,
//! so a medical-claims query cannot silently take an untranslated member id:
//!
//! ```rust
//! use claimsync::domain::{MemberId, ExternalId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let member_id = MemberId::new("M1001")?;
//! let external_id = ExternalId::new("1EG4-TE5-MK73")?;
//!
//! // This won't compile - type safety prevents mixing IDs
//! // let wrong: ExternalId = member_id;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod claims;
pub mod document;
pub mod eligibility;
pub mod errors;
pub mod ids;
pub mod result;
pub mod suspect;

// Re-export commonly used types for convenience
pub use claims::{safe_date, PharmacyClaim};
pub use document::{MemberClaimsDocument, UpsertSpec};
pub use eligibility::EligibilityRecord;
pub use errors::{InferenceError, StoreError, SyncError};
pub use ids::{ExternalId, MemberId};
pub use result::Result;
pub use suspect::{parse_suspects, Evidence, Suspect, SuspectDiagnosis};
