//! Suspect records produced by the inference service
//!
//! The inference service returns a JSON array of suspect objects for a batch
//! of staging documents. The schema is fixed; anything that doesn't conform
//! is dropped with a log record and the batch yields an empty result; the
//! run never crashes on upstream output.

use serde::{Deserialize, Serialize};

/// A suspected undiagnosed or undocumented condition for one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suspect {
    #[serde(rename = "memberId")]
    pub member_id: String,

    #[serde(rename = "suspectType")]
    pub suspect_type: String,

    #[serde(rename = "suspectDiagnosis")]
    pub suspect_diagnosis: SuspectDiagnosis,

    #[serde(rename = "confidenceScore")]
    pub confidence_score: f64,

    pub priority: String,

    pub evidence: Evidence,

    #[serde(rename = "suggestedAction")]
    pub suggested_action: String,
}

/// The ICD-10 diagnosis a suspect points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspectDiagnosis {
    pub code: String,
    pub description: String,
    #[serde(rename = "hccCategory")]
    pub hcc_category: String,
}

/// Supporting evidence for a suspect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub summary: String,
    pub details: Vec<String>,
}

/// Parse an inference-service response body into suspects
///
/// Lenient at the batch level, strict per element: a body that is not a JSON
/// array yields an error (the caller logs and treats the batch as empty);
/// array elements that don't conform to the schema are skipped individually
/// with a warning so one bad element doesn't discard its siblings.
pub fn parse_suspects(body: &str) -> Result<Vec<Suspect>, serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_str(body)?;

    let mut suspects = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<Suspect>(value) {
            Ok(suspect) => {
                if suspect.member_id.trim().is_empty() {
                    tracing::warn!("Skipping suspect without memberId");
                    continue;
                }
                suspects.push(suspect);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping non-conforming suspect element");
            }
        }
    }

    Ok(suspects)
}
