//! Domain identifier types with validation
//!
//! Newtype wrappers for the two identifier spaces the pipeline reconciles:
//! the primary member identifier used by eligibility and pharmacy sources,
//! and the external (crosswalked) identifier used by the medical-claims
//! source. Keeping them as distinct types prevents querying the wrong source
//! with the wrong id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primary member identifier
///
/// The key of eligibility records, pharmacy claims and staging documents.
///
/// # Examples
///
/// ```
/// use claimsync::domain::ids::MemberId;
/// use std::str::FromStr;
///
/// let member_id = MemberId::from_str("M1001").unwrap();
/// assert_eq!(member_id.as_str(), "M1001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(String);

impl MemberId {
    /// Creates a new MemberId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Member ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the member ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemberId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for MemberId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// External identifier used by the medical-claims source
///
/// Produced by the crosswalk; when a member has no crosswalk entry the
/// external id is the raw member id (identity fallback).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalId(String);

impl ExternalId {
    /// Creates a new ExternalId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("External ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the external ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<MemberId> for ExternalId {
    /// Identity fallback: a member with no crosswalk entry is queried under
    /// its raw member id.
    fn from(member_id: MemberId) -> Self {
        ExternalId(member_id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_id_valid() {
        let id = MemberId::new("M1001").unwrap();
        assert_eq!(id.as_str(), "M1001");
        assert_eq!(id.to_string(), "M1001");
    }

    #[test]
    fn test_member_id_empty() {
        assert!(MemberId::new("").is_err());
        assert!(MemberId::new("   ").is_err());
    }

    #[test]
    fn test_external_id_valid() {
        let id = ExternalId::new("1EG4-TE5-MK73").unwrap();
        assert_eq!(id.as_str(), "1EG4-TE5-MK73");
    }

    #[test]
    fn test_external_id_empty() {
        assert!(ExternalId::new("").is_err());
    }

    #[test]
    fn test_identity_fallback_conversion() {
        let member_id = MemberId::new("M42").unwrap();
        let external: ExternalId = member_id.into();
        assert_eq!(external.as_str(), "M42");
    }

    #[test]
    fn test_from_str() {
        let id: MemberId = "M7".parse().unwrap();
        assert_eq!(id.as_str(), "M7");
        let ext: ExternalId = "X7".parse().unwrap();
        assert_eq!(ext.as_str(), "X7");
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = MemberId::new("M1001").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"M1001\"");
        let back: MemberId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
