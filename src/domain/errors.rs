//! Domain error types
//!
//! This module defines the error hierarchy for claimsync. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main claimsync error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Inference service errors
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// A claims query for one member or batch failed.
    ///
    /// Distinct from "no claims found": a healthy query returning zero rows is
    /// `Ok(vec![])`, while a failed query surfaces here so the orchestrator
    /// can mark the member `Failed` instead of persisting an empty result.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Document merge errors
    #[error("Merge error: {0}")]
    Merge(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Document-store-specific errors
///
/// Errors that occur when interacting with the document store. Connectivity
/// errors are run-fatal at the orchestrator's control points; query and bulk
/// errors are contained at the smallest enclosing unit.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to the document store
    #[error("Failed to connect to document store: {0}")]
    ConnectionFailed(String),

    /// Failed to initialize the schema
    #[error("Failed to initialize schema: {0}")]
    SchemaFailed(String),

    /// A read query failed
    #[error("Query failed on '{collection}': {message}")]
    QueryFailed { collection: String, message: String },

    /// The whole bulk write was rejected (as opposed to per-operation failures,
    /// which are reported inside `BulkWriteReport`)
    #[error("Bulk write failed on '{collection}': {message}")]
    BulkWriteFailed { collection: String, message: String },

    /// A document could not be interpreted
    #[error("Invalid document in '{collection}': {message}")]
    InvalidDocument { collection: String, message: String },

    /// An upsert specification was rejected before execution
    #[error("Invalid upsert operation: {0}")]
    InvalidOperation(String),

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

/// Inference-service-specific errors
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Failed to reach the inference service
    #[error("Failed to reach inference service: {0}")]
    RequestFailed(String),

    /// Authentication rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Response did not conform to the suspect schema.
    ///
    /// Callers treat this as an empty result for the batch; it never aborts
    /// the run.
    #[error("Invalid response from inference service: {0}")]
    InvalidResponse(String),

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_store_error_conversion() {
        let store_err = StoreError::ConnectionFailed("Network error".to_string());
        let sync_err: SyncError = store_err.into();
        assert!(matches!(sync_err, SyncError::Store(_)));
    }

    #[test]
    fn test_inference_error_conversion() {
        let inf_err = InferenceError::InvalidResponse("not JSON".to_string());
        let sync_err: SyncError = inf_err.into();
        assert!(matches!(sync_err, SyncError::Inference(_)));
    }

    #[test]
    fn test_fetch_error_is_not_store_error() {
        // Fetch failures carry their own variant so the orchestrator can
        // distinguish them from connectivity failures.
        let err = SyncError::Fetch("medical query failed for member M1".to_string());
        assert!(matches!(err, SyncError::Fetch(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let sync_err: SyncError = io_err.into();
        assert!(matches!(sync_err, SyncError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let sync_err: SyncError = json_err.into();
        assert!(matches!(sync_err, SyncError::Serialization(_)));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let _: &dyn std::error::Error = &SyncError::Validation("x".to_string());
        let _: &dyn std::error::Error = &StoreError::Timeout("x".to_string());
        let _: &dyn std::error::Error = &InferenceError::Timeout("x".to_string());
    }
}
