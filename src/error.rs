//! Unified error handling for hivelink
//!
//! One taxonomy shared by the correlation layer, the subscription registry
//! and the notification service. Permission and visibility failures are
//! resolved into an error result at the service boundary; they are never
//! thrown across the correlation boundary.

use thiserror::Error;

/// Errors surfaced by hivelink operations
#[derive(Error, Debug)]
pub enum HiveError {
    /// Referenced device or notification does not exist or is not visible
    /// to the caller.
    #[error("Not found: {reason}")]
    NotFound { reason: String },

    /// Device exists but is not eligible for the requested operation.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Missing or malformed required fields in a submitted body.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// A correlation-layer call exceeded its wait budget. A long-poll
    /// timeout is not an error; it resolves as an empty result instead.
    #[error("Timed out: {reason}")]
    Timeout { reason: String },

    /// The backend worker reported a failure processing a request.
    #[error("Upstream failure: {reason}")]
    Upstream { reason: String },

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type for hivelink operations
pub type HiveResult<T> = Result<T, HiveError>;
