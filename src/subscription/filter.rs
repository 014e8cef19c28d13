//! Subscription filter matching

use crate::model::Notification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Filter a subscription applies to incoming notifications.
///
/// An empty `device_ids` set means "all visible devices" and an empty
/// `names` set means "any name". `since` is an exclusive lower bound: a
/// notification stamped exactly at `since` does not match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionFilter {
    pub device_ids: HashSet<String>,
    pub names: HashSet<String>,
    pub since: Option<DateTime<Utc>>,
}

impl SubscriptionFilter {
    pub fn new(
        device_ids: HashSet<String>,
        names: HashSet<String>,
        since: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            device_ids,
            names,
            since,
        }
    }

    /// Whether the notification passes every axis of the filter.
    pub fn matches(&self, notification: &Notification) -> bool {
        if !self.device_ids.is_empty() && !self.device_ids.contains(&notification.device_id) {
            return false;
        }
        if !self.names.is_empty() && !self.names.contains(&notification.notification) {
            return false;
        }
        match self.since {
            Some(since) => notification.timestamp > since,
            None => true,
        }
    }
}
