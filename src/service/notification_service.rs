//! Notification service core and resource-level operations
//!
//! `find`/`find_one`/`submit` speak to the backend worker through the
//! correlation layer. The resource-level operations (`query`, `get`,
//! `insert`; `poll` lives in [`super::poll`]) resolve permissions locally
//! through the [`DeviceResolver`] collaborator and map every failure into
//! the crate error taxonomy at this boundary.

use crate::auth::DeviceResolver;
use crate::config::HivelinkConfig;
use crate::error::{HiveError, HiveResult};
use crate::model::{Device, Notification, NotificationSubmission, Principal};
use crate::rpc::envelope::{
    to_body, Action, NotificationInsertRequest, NotificationInsertResponse,
    NotificationSearchRequest, NotificationSearchResponse,
};
use crate::rpc::RpcClient;
use crate::service::sort::{order_and_limit, SortField, SortOrder};
use crate::subscription::SubscriptionRegistry;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time::Duration;

/// Orchestrator over the correlation layer and the subscription registry.
pub struct NotificationService {
    pub(crate) rpc: Arc<RpcClient>,
    pub(crate) registry: Arc<SubscriptionRegistry>,
    pub(crate) devices: Arc<dyn DeviceResolver>,
    pub(crate) config: HivelinkConfig,
}

impl NotificationService {
    pub fn new(
        rpc: Arc<RpcClient>,
        registry: Arc<SubscriptionRegistry>,
        devices: Arc<dyn DeviceResolver>,
        config: HivelinkConfig,
    ) -> Self {
        Self {
            rpc,
            registry,
            devices,
            config,
        }
    }

    /// Registry handle, exposed so the ingestion path of an embedding
    /// process can fan notifications into live subscriptions.
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub(crate) fn rpc_wait(&self) -> Duration {
        Duration::from_secs(self.config.rpc_timeout_secs)
    }

    /// Historical search through the backend worker.
    ///
    /// Results come back in timestamp-ascending order, strictly newer than
    /// `since`, bounded to `limit`.
    pub async fn find(
        &self,
        device_ids: &[String],
        names: &[String],
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> HiveResult<Vec<Notification>> {
        let body = to_body(&NotificationSearchRequest {
            device_ids: device_ids.to_vec(),
            names: names.to_vec(),
            since,
            notification_id: None,
            limit: Some(limit),
        })?;
        let reply = self
            .rpc
            .call(Action::NotificationSearch, body, None, self.rpc_wait())
            .await?;
        let response: NotificationSearchResponse = reply.into_body()?;
        Ok(response.notifications)
    }

    /// Single-notification lookup scoped to device ownership. Absent is an
    /// empty result, not an error.
    pub async fn find_one(
        &self,
        notification_id: i64,
        device_id: &str,
    ) -> HiveResult<Option<Notification>> {
        let body = to_body(&NotificationSearchRequest {
            device_ids: vec![device_id.to_string()],
            names: Vec::new(),
            since: None,
            notification_id: Some(notification_id),
            limit: Some(1),
        })?;
        let reply = self
            .rpc
            .call(Action::NotificationSearch, body, None, self.rpc_wait())
            .await?;
        let response: NotificationSearchResponse = reply.into_body()?;
        Ok(response.notifications.into_iter().next())
    }

    /// Append a validated submission through the backend worker and fan
    /// the stored notification out to live subscribers. The push runs
    /// synchronously with the write path; it is never skipped, whether
    /// zero or many subscriptions currently match.
    pub async fn submit(
        &self,
        device: &Device,
        submission: NotificationSubmission,
    ) -> HiveResult<Notification> {
        let name = submission
            .notification
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| HiveError::InvalidRequest {
                reason: "notification name is required".to_string(),
            })?;

        let body = to_body(&NotificationInsertRequest {
            device_id: device.device_id.clone(),
            notification: name.to_string(),
            parameters: submission.parameters,
            timestamp: submission.timestamp,
        })?;
        let reply = self
            .rpc
            .call(Action::NotificationInsert, body, None, self.rpc_wait())
            .await?;
        let response: NotificationInsertResponse = reply.into_body()?;
        let created = response.notification;

        let delivered = self.registry.notify(&created).await;
        log::debug!(
            "notification {} stored for device {}, {} live deliveries",
            created.id,
            created.device_id,
            delivered
        );
        Ok(created)
    }

    /// Historical query entry point with sorting and pagination.
    #[allow(clippy::too_many_arguments)]
    pub async fn query(
        &self,
        principal: &Principal,
        device_id: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        name: Option<&str>,
        sort_field: Option<&str>,
        sort_order: Option<&str>,
        take: Option<usize>,
        skip: Option<usize>,
    ) -> HiveResult<Vec<Notification>> {
        log::debug!("notification query requested for device {}", device_id);
        let device = self.visible_device(device_id, principal).await?;

        let names: Vec<String> = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| vec![n.to_string()])
            .unwrap_or_default();

        let found = self
            .find(
                std::slice::from_ref(&device.device_id),
                &names,
                since,
                self.config.default_take,
            )
            .await
            .map_err(|e| {
                log::warn!("notification query failed for device {}: {}", device_id, e);
                HiveError::NotFound {
                    reason: format!("no notifications found for device {}", device_id),
                }
            })?;

        let mut notifications = found;
        if let Some(until) = until {
            notifications.retain(|n| n.timestamp <= until);
        }

        Ok(order_and_limit(
            notifications,
            SortField::parse(sort_field),
            SortOrder::parse(sort_order),
            skip,
            take,
        ))
    }

    /// Single-notification fetch entry point.
    pub async fn get(
        &self,
        principal: &Principal,
        device_id: &str,
        notification_id: i64,
    ) -> HiveResult<Notification> {
        log::debug!(
            "notification requested, device {}, notification id {}",
            device_id,
            notification_id
        );
        self.visible_device(device_id, principal).await?;

        match self.find_one(notification_id, device_id).await? {
            Some(notification) => Ok(notification),
            None => {
                log::warn!(
                    "no notification with id = {} found for device {}",
                    notification_id,
                    device_id
                );
                Err(HiveError::NotFound {
                    reason: format!(
                        "notification {} not found for device {}",
                        notification_id, device_id
                    ),
                })
            }
        }
    }

    /// Submit entry point with permission and eligibility checks.
    pub async fn insert(
        &self,
        principal: &Principal,
        device_id: &str,
        submission: NotificationSubmission,
    ) -> HiveResult<Notification> {
        log::debug!("notification insert requested for device {}", device_id);
        if submission
            .notification
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .is_none()
        {
            log::warn!("notification insert rejected: notification name is required");
            return Err(HiveError::InvalidRequest {
                reason: "notification name is required".to_string(),
            });
        }

        let device = self.visible_device(device_id, principal).await?;
        if device.network_id.is_none() {
            log::warn!(
                "notification insert rejected: device {} is not connected to a network",
                device_id
            );
            return Err(HiveError::Forbidden {
                reason: format!("device {} is not connected to a network", device_id),
            });
        }

        self.submit(&device, submission).await
    }

    /// Resolve a device the principal may observe, or a NotFound carrying
    /// the requested id.
    pub(crate) async fn visible_device(
        &self,
        device_id: &str,
        principal: &Principal,
    ) -> HiveResult<Device> {
        self.devices
            .find_device(device_id, principal)
            .await?
            .ok_or_else(|| HiveError::NotFound {
                reason: format!("device {} not found", device_id),
            })
    }
}
