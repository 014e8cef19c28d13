//! Notification value types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A timestamped event emitted by a device. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    /// Storage-assigned identifier
    pub id: i64,
    /// Owning device
    pub device_id: String,
    /// Notification name, matched against subscription name filters
    pub notification: String,
    /// Opaque parameter payload
    #[serde(default)]
    pub parameters: Value,
    /// Emission time; the exclusive lower bound for `since` filters
    pub timestamp: DateTime<Utc>,
}

/// Client-submitted notification body, prior to storage assignment.
///
/// `notification` is required; a missing or blank name is rejected as an
/// invalid request. A missing `timestamp` defaults to the insertion time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationSubmission {
    pub notification: Option<String>,
    #[serde(default)]
    pub parameters: Value,
    pub timestamp: Option<DateTime<Utc>>,
}

impl NotificationSubmission {
    /// Create a submission carrying just a name.
    pub fn named(notification: impl Into<String>) -> Self {
        Self {
            notification: Some(notification.into()),
            ..Self::default()
        }
    }

    /// Attach a parameter payload.
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Pin the emission time instead of defaulting to insertion time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
