//! Registry of pending subscriptions
//!
//! The index only ever holds Pending subscriptions. A terminal transition
//! (Fulfilled, TimedOut, Cancelled) removes the entry under the registry
//! lock; delivery into the extracted one-shot slot happens after the lock
//! is released, so ingestion of further notifications is never blocked on
//! a receiver. At-most-once delivery is structural: the slot is
//! single-assignment and the entry can only be removed once.

use crate::model::Notification;
use crate::subscription::filter::SubscriptionFilter;
use std::collections::HashMap;
use tokio::sync::{oneshot, Mutex};
use uuid::Uuid;

/// Terminal state a subscription can reach. An entry still in the index
/// is pending; reaching any of these removes it, and they are mutually
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubscriptionState {
    Fulfilled,
    TimedOut,
    Cancelled,
}

impl SubscriptionState {
    fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::Fulfilled => "Fulfilled",
            SubscriptionState::TimedOut => "TimedOut",
            SubscriptionState::Cancelled => "Cancelled",
        }
    }
}

/// Handle returned to the poll path: the subscription id for explicit
/// deregistration plus the one-shot receiver the caller suspends on.
pub struct Subscription {
    pub id: Uuid,
    pub receiver: oneshot::Receiver<Notification>,
}

struct SubscriptionEntry {
    filter: SubscriptionFilter,
    slot: oneshot::Sender<Notification>,
}

/// Index of pending subscriptions, matched on every stored notification.
pub struct SubscriptionRegistry {
    subscriptions: Mutex<HashMap<Uuid, SubscriptionEntry>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Register a filter and return the delivery handle.
    pub async fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        {
            let mut subscriptions = self.subscriptions.lock().await;
            subscriptions.insert(
                id,
                SubscriptionEntry {
                    filter,
                    slot: tx,
                },
            );
        }
        log::debug!("subscription {} registered", id);
        Subscription { id, receiver: rx }
    }

    /// Explicit cancellation. Returns false if the subscription already
    /// reached a terminal state.
    pub async fn cancel(&self, id: Uuid) -> bool {
        self.close(id, SubscriptionState::Cancelled).await
    }

    /// Timeout expiry; same removal as [`cancel`](Self::cancel) with a
    /// different terminal state.
    pub async fn expire(&self, id: Uuid) -> bool {
        self.close(id, SubscriptionState::TimedOut).await
    }

    async fn close(&self, id: Uuid, state: SubscriptionState) -> bool {
        let removed = { self.subscriptions.lock().await.remove(&id) };
        match removed {
            Some(_) => {
                log::debug!("subscription {} -> {}", id, state.as_str());
                true
            }
            None => false,
        }
    }

    /// Match a newly stored notification against every pending
    /// subscription. Each match transitions to Fulfilled, leaves the index
    /// and receives the notification exactly once; first match wins per
    /// subscription. Returns the number of deliveries that reached a
    /// still-listening receiver.
    pub async fn notify(&self, notification: &Notification) -> usize {
        let matched: Vec<(Uuid, oneshot::Sender<Notification>)> = {
            let mut subscriptions = self.subscriptions.lock().await;
            let ids: Vec<Uuid> = subscriptions
                .iter()
                .filter(|(_, entry)| entry.filter.matches(notification))
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| subscriptions.remove(&id).map(|entry| (id, entry.slot)))
                .collect()
        };

        let mut delivered = 0;
        for (id, slot) in matched {
            if slot.send(notification.clone()).is_ok() {
                log::debug!(
                    "subscription {} -> {} with notification {}",
                    id,
                    SubscriptionState::Fulfilled.as_str(),
                    notification.id
                );
                delivered += 1;
            } else {
                // Receiver went away between removal and delivery.
                log::debug!("subscription {} receiver dropped before delivery", id);
            }
        }
        delivered
    }

    /// Number of pending subscriptions; bounded by the number of in-flight
    /// polls.
    pub async fn len(&self) -> usize {
        self.subscriptions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Value;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn notification(id: i64, device_id: &str, name: &str) -> Notification {
        Notification {
            id,
            device_id: device_id.to_string(),
            notification: name.to_string(),
            parameters: Value::Null,
            timestamp: Utc::now(),
        }
    }

    fn device_filter(device_id: &str) -> SubscriptionFilter {
        SubscriptionFilter::new(
            [device_id.to_string()].into_iter().collect(),
            HashSet::new(),
            None,
        )
    }

    #[tokio::test]
    async fn test_delivery_removes_subscription() {
        let registry = SubscriptionRegistry::new();
        let subscription = registry.subscribe(device_filter("d1")).await;
        assert_eq!(registry.len().await, 1);

        let delivered = registry.notify(&notification(1, "d1", "temp")).await;
        assert_eq!(delivered, 1);
        assert_eq!(registry.len().await, 0);

        let received = subscription.receiver.await.unwrap();
        assert_eq!(received.id, 1);
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let registry = SubscriptionRegistry::new();
        let subscription = registry.subscribe(device_filter("d1")).await;

        registry.notify(&notification(1, "d1", "temp")).await;
        // Second matching notification finds no pending subscription.
        let delivered = registry.notify(&notification(2, "d1", "temp")).await;
        assert_eq!(delivered, 0);

        let received = subscription.receiver.await.unwrap();
        assert_eq!(received.id, 1);
    }

    #[tokio::test]
    async fn test_non_matching_notification_leaves_subscription_pending() {
        let registry = SubscriptionRegistry::new();
        let _subscription = registry.subscribe(device_filter("d1")).await;

        let delivered = registry.notify(&notification(1, "d2", "temp")).await;
        assert_eq!(delivered, 0);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_cancel_is_terminal_and_idempotent() {
        let registry = SubscriptionRegistry::new();
        let subscription = registry.subscribe(device_filter("d1")).await;

        assert!(registry.cancel(subscription.id).await);
        assert!(!registry.cancel(subscription.id).await);
        assert!(!registry.expire(subscription.id).await);
        assert_eq!(registry.len().await, 0);

        // No delivery can reach a cancelled subscription.
        registry.notify(&notification(1, "d1", "temp")).await;
        assert!(subscription.receiver.await.is_err());
    }

    #[tokio::test]
    async fn test_one_notification_fans_out_to_all_matches() {
        let registry = SubscriptionRegistry::new();
        let first = registry.subscribe(device_filter("d1")).await;
        let second = registry.subscribe(SubscriptionFilter::default()).await;
        let other = registry.subscribe(device_filter("d2")).await;

        let delivered = registry.notify(&notification(5, "d1", "temp")).await;
        assert_eq!(delivered, 2);
        assert_eq!(registry.len().await, 1);

        assert_eq!(first.receiver.await.unwrap().id, 5);
        assert_eq!(second.receiver.await.unwrap().id, 5);
        assert!(registry.cancel(other.id).await);
    }

    #[tokio::test]
    async fn test_racing_delivery_and_expiry_resolve_exactly_once() {
        for round in 0..100 {
            let registry = Arc::new(SubscriptionRegistry::new());
            let subscription = registry.subscribe(device_filter("d1")).await;
            let id = subscription.id;

            let notifier = {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.notify(&notification(1, "d1", "temp")).await })
            };
            let expirer = {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.expire(id).await })
            };

            let delivered = notifier.await.unwrap();
            let expired = expirer.await.unwrap();
            assert_eq!(
                delivered + usize::from(expired),
                1,
                "round {}: exactly one side may remove the subscription",
                round
            );
            assert_eq!(registry.len().await, 0);

            if delivered == 1 {
                assert_eq!(subscription.receiver.await.unwrap().id, 1);
            } else {
                // Expiry won; the slot was dropped without a send.
                assert!(subscription.receiver.await.is_err());
            }
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_counts_as_undelivered() {
        let registry = SubscriptionRegistry::new();
        let subscription = registry.subscribe(device_filter("d1")).await;
        drop(subscription.receiver);

        let delivered = registry.notify(&notification(1, "d1", "temp")).await;
        assert_eq!(delivered, 0);
        assert_eq!(registry.len().await, 0);
    }
}
