//! Long-poll coordination
//!
//! Per request: resolve visibility, register a subscription, then run the
//! historical lookup. A notification landing between resolution and
//! registration is caught by the push path; it can never be delivered
//! twice because a non-empty historical result cancels the subscription
//! before the caller ever awaits the push. Every exit path deregisters
//! the subscription, so registry memory stays bounded by the number of
//! in-flight polls.

use crate::error::HiveResult;
use crate::model::{Notification, Principal};
use crate::service::notification_service::NotificationService;
use crate::subscription::{Subscription, SubscriptionFilter};
use chrono::{DateTime, Utc};
use tokio::time::{sleep, Duration};

impl NotificationService {
    /// Block until a matching notification exists or the timeout elapses.
    ///
    /// `device_ids` and `names` are comma-separated sets (a single token
    /// is a one-element set; `None` imposes no restriction). `since` is an
    /// exclusive lower bound. A negative `timeout_secs` short-circuits to
    /// an immediate empty result without registering a subscription;
    /// non-negative values are clamped to the configured maximum wait.
    pub async fn poll(
        &self,
        principal: &Principal,
        device_ids: Option<&str>,
        names: Option<&str>,
        since: Option<DateTime<Utc>>,
        timeout_secs: i64,
    ) -> HiveResult<Vec<Notification>> {
        if timeout_secs < 0 {
            return Ok(Vec::new());
        }
        let wait = Duration::from_secs((timeout_secs as u64).min(self.config.max_wait_secs));

        let requested = parse_csv(device_ids);
        let visible = self.devices.visible_devices(&requested, principal).await?;
        let visible_ids: Vec<String> = visible.into_iter().map(|d| d.device_id).collect();
        if visible_ids.is_empty() {
            if !requested.is_empty() {
                // The caller named devices it cannot observe.
                return Err(crate::error::HiveError::NotFound {
                    reason: format!("no accessible devices among {}", requested.join(",")),
                });
            }
            // Nothing this principal may observe at all; an unrestricted
            // subscription would leak other callers' devices.
            log::debug!(
                "poll for {} resolves no visible devices, returning empty",
                principal.login
            );
            return Ok(Vec::new());
        }
        let names = parse_csv(names);

        let filter = SubscriptionFilter::new(
            visible_ids.iter().cloned().collect(),
            names.iter().cloned().collect(),
            since,
        );
        // Register before the historical read so nothing lands unseen in
        // between.
        let subscription = self.registry.subscribe(filter).await;
        log::debug!(
            "poll subscription {} registered for devices {:?}, timeout {:?}",
            subscription.id,
            visible_ids,
            wait
        );

        let historical = match self
            .find(&visible_ids, &names, since, self.config.default_take)
            .await
        {
            Ok(list) => list,
            Err(e) => {
                self.registry.cancel(subscription.id).await;
                return Err(e);
            }
        };
        if !historical.is_empty() {
            self.registry.cancel(subscription.id).await;
            return Ok(historical);
        }

        let Subscription { id, receiver } = subscription;
        tokio::select! {
            pushed = receiver => match pushed {
                // Delivery already removed the subscription from the index.
                Ok(notification) => Ok(vec![notification]),
                Err(_) => {
                    // Sender side went away without a delivery.
                    self.registry.cancel(id).await;
                    Ok(Vec::new())
                }
            },
            _ = sleep(wait) => {
                self.registry.expire(id).await;
                log::debug!("poll subscription {} timed out after {:?}", id, wait);
                Ok(Vec::new())
            }
        }
    }
}

/// Split a comma-separated parameter into trimmed, non-empty tokens.
fn parse_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
