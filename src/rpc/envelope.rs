//! Action envelopes and typed request/response bodies
//!
//! An envelope carries an action tag, a correlation id and an opaque JSON
//! body. Typed bodies are encoded into the envelope with [`to_body`] and
//! decoded out of a reply with [`ActionReply::into_body`], keeping the
//! transport ignorant of individual action payloads.

use crate::error::{HiveError, HiveResult};
use crate::model::{Notification, Principal};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Action tags understood by the backend worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    NotificationSearch,
    NotificationInsert,
    CountDevice,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::NotificationSearch => "NotificationSearch",
            Action::NotificationInsert => "NotificationInsert",
            Action::CountDevice => "CountDevice",
        }
    }
}

/// Outbound request envelope.
///
/// The correlation id is a v4 UUID: 128 random bits, so collisions among
/// in-flight calls cannot occur within a process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub correlation_id: Uuid,
    pub action: Action,
    pub body: Value,
    pub principal: Option<Principal>,
}

impl ActionRequest {
    pub fn new(action: Action, body: Value, principal: Option<Principal>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            action,
            body,
            principal,
        }
    }
}

/// Outcome reported by the backend worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ReplyStatus {
    Success,
    Failed { reason: String },
}

/// Inbound reply envelope, carrying the correlation id of its request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReply {
    pub correlation_id: Uuid,
    pub status: ReplyStatus,
    pub body: Value,
}

impl ActionReply {
    pub fn success(correlation_id: Uuid, body: Value) -> Self {
        Self {
            correlation_id,
            status: ReplyStatus::Success,
            body,
        }
    }

    pub fn failed(correlation_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            correlation_id,
            status: ReplyStatus::Failed {
                reason: reason.into(),
            },
            body: Value::Null,
        }
    }

    /// Decode the typed body of a successful reply. A failed reply or an
    /// undecodable body surfaces as an upstream error.
    pub fn into_body<T: DeserializeOwned>(self) -> HiveResult<T> {
        match self.status {
            ReplyStatus::Success => serde_json::from_value(self.body).map_err(|e| {
                HiveError::Upstream {
                    reason: format!("undecodable reply body: {}", e),
                }
            }),
            ReplyStatus::Failed { reason } => Err(HiveError::Upstream { reason }),
        }
    }
}

/// Encode a typed body into an envelope payload.
pub fn to_body<T: Serialize>(value: &T) -> HiveResult<Value> {
    serde_json::to_value(value).map_err(|e| HiveError::InvalidRequest {
        reason: format!("unencodable request body: {}", e),
    })
}

/// Historical notification search.
///
/// Empty `device_ids` / `names` impose no restriction on that axis;
/// `since` is an exclusive lower bound on the timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationSearchRequest {
    #[serde(default)]
    pub device_ids: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    pub since: Option<DateTime<Utc>>,
    /// Restrict to a single notification id (device-scoped single lookup).
    pub notification_id: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationSearchResponse {
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationInsertRequest {
    pub device_id: String,
    pub notification: String,
    #[serde(default)]
    pub parameters: Value,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationInsertResponse {
    pub notification: Notification,
}

/// Device count request, the reference example of the general typed
/// request shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CountDeviceRequest {
    pub name: Option<String>,
    pub name_pattern: Option<String>,
    pub network_id: Option<i64>,
    pub network_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountDeviceResponse {
    pub count: usize,
}
