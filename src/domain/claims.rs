//! Claim models and normalization
//!
//! Medical claims stay opaque: they are retrieved under a fixed dotted-path
//! projection and nested as-is into the staging document. Pharmacy claims are
//! normalized into a canonical shape so downstream consumers see one schema
//! regardless of feed quirks.

use crate::domain::ids::MemberId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Projection applied to every medical-claims query, in both fetch strategies.
///
/// Dotted paths address nested fields in the source documents; the store
/// returns them as a flat dotted-key map which is nested again before merge.
pub const MEDICAL_PROJECTION: &[&str] = &[
    "Diagnosis.Diag_Codes",
    "ServiceLine.LXServiceNo",
    "ServiceLine.BilledCPT_Code",
    "ServiceLine.BilledCPTDesc",
    "ServiceLine.Line_SvcDate",
    "Claim.ClaimID",
    "Claim.POS",
    "Type_of_Bill",
    "Provider.BillProv_NPI",
    "Provider.BillProv_LastName",
    "Member.Subscriber_ID",
    "Member.Subscriber_DOB",
    "Member.Subscriber_Gender",
];

/// Field path identifying the member in the medical-claims source.
/// Queried with the crosswalked external id.
pub const MEDICAL_MEMBER_FIELD: &str = "Member.Subscriber_ID";

/// Projection applied to every pharmacy-claims query.
pub const PHARMACY_PROJECTION: &[&str] = &[
    "Member ID",
    "NDC",
    "Product Label Name",
    "Fill Date",
    "Days Supply",
    "Metric Quantity",
    "Prescriber ID",
    "Prescriber Name",
    "Total Billed",
];

/// Field identifying the member in the pharmacy-claims source.
/// Queried with the raw member id (pharmacy is not crosswalked).
pub const PHARMACY_MEMBER_FIELD: &str = "Member ID";

/// A pharmacy claim in canonical shape
///
/// All fields except `member_id` are optional; the source feed is sparse and
/// absent values serialize as JSON null rather than being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyClaim {
    #[serde(rename = "memberId")]
    pub member_id: String,
    pub ndc: Option<String>,
    #[serde(rename = "drugName")]
    pub drug_name: Option<String>,
    /// Calendar date as `YYYY-MM-DD`; None if missing or unparsable
    #[serde(rename = "fillDate")]
    pub fill_date: Option<String>,
    #[serde(rename = "daysSupply")]
    pub days_supply: Option<Value>,
    #[serde(rename = "quantityDispensed")]
    pub quantity_dispensed: Option<Value>,
    #[serde(rename = "prescriberNPI")]
    pub prescriber_npi: Option<Value>,
    #[serde(rename = "prescriberName")]
    pub prescriber_name: Option<String>,
    #[serde(rename = "totalBilled")]
    pub total_billed: Option<Value>,
}

impl PharmacyClaim {
    /// Normalize a raw pharmacy-claim document for a member
    ///
    /// The member id in the output is always the pipeline's member id, not
    /// whatever the source row carried, so the staging document is
    /// self-consistent.
    pub fn normalize(member_id: &MemberId, raw: &Value) -> Self {
        Self {
            member_id: member_id.as_str().to_string(),
            ndc: raw.get("NDC").and_then(stringify),
            drug_name: raw
                .get("Product Label Name")
                .and_then(Value::as_str)
                .map(str::to_string),
            fill_date: raw.get("Fill Date").and_then(safe_date),
            days_supply: non_null(raw.get("Days Supply")),
            quantity_dispensed: non_null(raw.get("Metric Quantity")),
            prescriber_npi: non_null(raw.get("Prescriber ID")),
            prescriber_name: raw
                .get("Prescriber Name")
                .and_then(Value::as_str)
                .map(str::to_string),
            total_billed: non_null(raw.get("Total Billed")),
        }
    }
}

/// Export a date value as a `YYYY-MM-DD` calendar-date string
///
/// Accepts ISO date strings, ISO datetime strings, and epoch-millisecond
/// numbers (how document stores commonly surface dates). A missing or
/// unparsable value yields None, never an error.
pub fn safe_date(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            if s.is_empty() {
                return None;
            }
            // Full ISO date or datetime; take the calendar-date prefix.
            let prefix = s.get(..10).unwrap_or(s.as_str());
            if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return Some(date.format("%Y-%m-%d").to_string());
            }
            None
        }
        Value::Number(n) => {
            let millis = n.as_i64()?;
            let dt = chrono::DateTime::from_timestamp_millis(millis)?;
            Some(dt.date_naive().format("%Y-%m-%d").to_string())
        }
        _ => None,
    }
}

/// Coerce a scalar to its string form, matching the source convention of
/// string-typed NDC codes even when the feed delivers numbers.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    match value {
        Some(Value::Null) | None => None,
        Some(v) => Some(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn member() -> MemberId {
        MemberId::new("M1001").unwrap()
    }

    #[test]
    fn test_normalize_full_claim() {
        let raw = json!({
            "Member ID": "M1001",
            "NDC": "00093-7424-56",
            "Product Label Name": "METFORMIN HCL 500MG",
            "Fill Date": "2024-05-14",
            "Days Supply": 30,
            "Metric Quantity": 60.0,
            "Prescriber ID": "1881634559",
            "Prescriber Name": "SMITH, JOHN",
            "Total Billed": 12.47,
        });

        let claim = PharmacyClaim::normalize(&member(), &raw);

        assert_eq!(claim.member_id, "M1001");
        assert_eq!(claim.ndc.as_deref(), Some("00093-7424-56"));
        assert_eq!(claim.drug_name.as_deref(), Some("METFORMIN HCL 500MG"));
        assert_eq!(claim.fill_date.as_deref(), Some("2024-05-14"));
        assert_eq!(claim.days_supply, Some(json!(30)));
        assert_eq!(claim.total_billed, Some(json!(12.47)));
    }

    #[test]
    fn test_normalize_sparse_claim() {
        let claim = PharmacyClaim::normalize(&member(), &json!({"NDC": 937424}));

        // Numeric NDC is stringified; everything else absent.
        assert_eq!(claim.ndc.as_deref(), Some("937424"));
        assert!(claim.drug_name.is_none());
        assert!(claim.fill_date.is_none());
        assert!(claim.days_supply.is_none());
    }

    #[test]
    fn test_normalize_overrides_source_member_id() {
        let raw = json!({"Member ID": "SOMETHING_ELSE"});
        let claim = PharmacyClaim::normalize(&member(), &raw);
        assert_eq!(claim.member_id, "M1001");
    }

    #[test_case(json!("2024-05-14") => Some("2024-05-14".to_string()); "plain date")]
    #[test_case(json!("2024-05-14T10:30:00Z") => Some("2024-05-14".to_string()); "datetime prefix")]
    #[test_case(json!("") => None; "empty string")]
    #[test_case(json!("not a date") => None; "garbage")]
    #[test_case(json!(null) => None; "null")]
    #[test_case(json!(true) => None; "wrong type")]
    fn test_safe_date(value: Value) -> Option<String> {
        safe_date(&value)
    }

    #[test]
    fn test_safe_date_epoch_millis() {
        // 2024-05-14T00:00:00Z
        let value = json!(1_715_644_800_000_i64);
        assert_eq!(safe_date(&value), Some("2024-05-14".to_string()));
    }

    #[test]
    fn test_serialization_uses_camel_case_keys() {
        let claim = PharmacyClaim::normalize(&member(), &json!({"Fill Date": "2024-01-02"}));
        let value = serde_json::to_value(&claim).unwrap();

        assert_eq!(value["memberId"], "M1001");
        assert_eq!(value["fillDate"], "2024-01-02");
        // Absent fields are serialized as explicit nulls.
        assert!(value["drugName"].is_null());
        assert!(value.get("drugName").is_some());
    }
}
