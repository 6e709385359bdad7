//! Result type alias for claimsync

use super::errors::SyncError;

/// Result type alias for claimsync operations
///
/// This is a convenience type alias that uses `SyncError` as the error type.
/// Use this throughout the codebase for fallible operations.
pub type Result<T> = std::result::Result<T, SyncError>;
