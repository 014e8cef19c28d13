//! In-memory backend worker, store and device resolver
//!
//! Serves the action requests the correlation layer emits, against an
//! append-only in-memory store. The worker drains the outbound transport
//! channel and writes replies to the inbound channel, mirroring how a
//! remote worker would sit on the far side of a broker.

use crate::auth::DeviceResolver;
use crate::error::HiveResult;
use crate::model::{Device, Notification, Principal};
use crate::rpc::envelope::{
    Action, ActionReply, ActionRequest, CountDeviceRequest, CountDeviceResponse,
    NotificationInsertRequest, NotificationInsertResponse, NotificationSearchRequest,
    NotificationSearchResponse,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

/// Append-only notification store with monotonic id assignment.
pub struct MemoryNotificationStore {
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    next_id: i64,
    notifications: Vec<Notification>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                next_id: 1,
                notifications: Vec::new(),
            }),
        }
    }

    /// Store a submission, assigning the id and defaulting the timestamp
    /// to the insertion time.
    pub async fn append(&self, request: NotificationInsertRequest) -> Notification {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;
        let notification = Notification {
            id,
            device_id: request.device_id,
            notification: request.notification,
            parameters: request.parameters,
            timestamp: request.timestamp.unwrap_or_else(Utc::now),
        };
        inner.notifications.push(notification.clone());
        notification
    }

    /// Apply the search predicate: device/name membership (empty set = no
    /// restriction), strictly-greater timestamp, optional id, ascending
    /// order, bounded by the limit.
    pub async fn search(&self, request: &NotificationSearchRequest) -> Vec<Notification> {
        let inner = self.inner.lock().await;
        let mut matched: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| {
                (request.device_ids.is_empty() || request.device_ids.contains(&n.device_id))
                    && (request.names.is_empty() || request.names.contains(&n.notification))
                    && request.since.map_or(true, |since| n.timestamp > since)
                    && request.notification_id.map_or(true, |id| n.id == id)
            })
            .cloned()
            .collect();
        matched.sort_by_key(|n| n.timestamp);
        if let Some(limit) = request.limit {
            matched.truncate(limit);
        }
        matched
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.notifications.len()
    }
}

impl Default for MemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn a worker serving action requests against the store and device
/// list. Runs until the request channel closes.
pub fn spawn_worker(
    store: Arc<MemoryNotificationStore>,
    devices: Vec<Device>,
    requests: mpsc::UnboundedReceiver<ActionRequest>,
    replies: mpsc::UnboundedSender<ActionReply>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stream = UnboundedReceiverStream::new(requests);
        while let Some(request) = stream.next().await {
            let reply = handle_request(&store, &devices, request).await;
            if replies.send(reply).is_err() {
                log::debug!("reply channel closed, memory worker stopping");
                break;
            }
        }
    })
}

async fn handle_request(
    store: &MemoryNotificationStore,
    devices: &[Device],
    request: ActionRequest,
) -> ActionReply {
    let correlation_id = request.correlation_id;
    match request.action {
        Action::NotificationSearch => {
            with_body(correlation_id, request.body, |req: NotificationSearchRequest| async move {
                NotificationSearchResponse {
                    notifications: store.search(&req).await,
                }
            })
            .await
        }
        Action::NotificationInsert => {
            with_body(correlation_id, request.body, |req: NotificationInsertRequest| async move {
                NotificationInsertResponse {
                    notification: store.append(req).await,
                }
            })
            .await
        }
        Action::CountDevice => {
            with_body(correlation_id, request.body, |req: CountDeviceRequest| async move {
                CountDeviceResponse {
                    count: count_devices(devices, &req),
                }
            })
            .await
        }
    }
}

/// Decode the body, run the handler, encode the response. Malformed
/// bodies and unencodable responses come back as failed replies.
async fn with_body<Req, Resp, F, Fut>(
    correlation_id: uuid::Uuid,
    body: serde_json::Value,
    handler: F,
) -> ActionReply
where
    Req: DeserializeOwned,
    Resp: Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: std::future::Future<Output = Resp>,
{
    let request: Req = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => return ActionReply::failed(correlation_id, format!("malformed body: {}", e)),
    };
    let response = handler(request).await;
    match serde_json::to_value(&response) {
        Ok(body) => ActionReply::success(correlation_id, body),
        Err(e) => ActionReply::failed(correlation_id, format!("unencodable response: {}", e)),
    }
}

fn count_devices(devices: &[Device], request: &CountDeviceRequest) -> usize {
    devices
        .iter()
        .filter(|d| {
            request.name.as_deref().map_or(true, |name| d.name == name)
                && request
                    .name_pattern
                    .as_deref()
                    .map_or(true, |pattern| d.name.contains(pattern))
                && request
                    .network_id
                    .map_or(true, |network_id| d.network_id == Some(network_id))
                && request
                    .network_name
                    .as_deref()
                    .map_or(true, |network_name| {
                        d.network_name.as_deref() == Some(network_name)
                    })
        })
        .count()
}

/// Device registry with per-principal grants.
pub struct MemoryDeviceResolver {
    devices: HashMap<String, Device>,
    grants: HashMap<String, HashSet<String>>,
    admins: HashSet<String>,
}

impl MemoryDeviceResolver {
    pub fn new() -> Self {
        Self {
            devices: HashMap::new(),
            grants: HashMap::new(),
            admins: HashSet::new(),
        }
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.devices.insert(device.device_id.clone(), device);
        self
    }

    /// Grant one principal visibility of one device.
    pub fn grant(mut self, login: &str, device_id: &str) -> Self {
        self.grants
            .entry(login.to_string())
            .or_default()
            .insert(device_id.to_string());
        self
    }

    /// Grant one principal visibility of every device.
    pub fn grant_all(mut self, login: &str) -> Self {
        self.admins.insert(login.to_string());
        self
    }

    pub fn devices(&self) -> Vec<Device> {
        self.devices.values().cloned().collect()
    }

    fn can_see(&self, login: &str, device_id: &str) -> bool {
        self.admins.contains(login)
            || self
                .grants
                .get(login)
                .map_or(false, |granted| granted.contains(device_id))
    }
}

impl Default for MemoryDeviceResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceResolver for MemoryDeviceResolver {
    async fn find_device(
        &self,
        device_id: &str,
        principal: &Principal,
    ) -> HiveResult<Option<Device>> {
        if !self.can_see(&principal.login, device_id) {
            return Ok(None);
        }
        Ok(self.devices.get(device_id).cloned())
    }

    async fn visible_devices(
        &self,
        requested: &[String],
        principal: &Principal,
    ) -> HiveResult<Vec<Device>> {
        let mut visible: Vec<Device> = self
            .devices
            .values()
            .filter(|d| self.can_see(&principal.login, &d.device_id))
            .filter(|d| requested.is_empty() || requested.iter().any(|r| r == &d.device_id))
            .cloned()
            .collect();
        visible.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        Ok(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn test_append_assigns_ascending_ids_and_default_timestamp() {
        let store = MemoryNotificationStore::new();
        let before = Utc::now();
        let first = store
            .append(NotificationInsertRequest {
                device_id: "d1".to_string(),
                notification: "temp".to_string(),
                parameters: json!({}),
                timestamp: None,
            })
            .await;
        let second = store
            .append(NotificationInsertRequest {
                device_id: "d1".to_string(),
                notification: "temp".to_string(),
                parameters: json!({}),
                timestamp: None,
            })
            .await;

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(first.timestamp >= before);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_search_predicate_and_limit() {
        let store = MemoryNotificationStore::new();
        let base = Utc::now();
        for i in 1..=5 {
            store
                .append(NotificationInsertRequest {
                    device_id: "d1".to_string(),
                    notification: "temp".to_string(),
                    parameters: json!({}),
                    timestamp: Some(base + Duration::seconds(i)),
                })
                .await;
        }

        let found = store
            .search(&NotificationSearchRequest {
                device_ids: vec!["d1".to_string()],
                names: Vec::new(),
                since: Some(base),
                notification_id: None,
                limit: Some(2),
            })
            .await;
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].timestamp, base + Duration::seconds(1));
        assert_eq!(found[1].timestamp, base + Duration::seconds(2));

        // since is exclusive
        let excluded = store
            .search(&NotificationSearchRequest {
                since: Some(base + Duration::seconds(5)),
                ..Default::default()
            })
            .await;
        assert!(excluded.is_empty());
    }

    #[tokio::test]
    async fn test_count_devices_by_filters() {
        let devices = vec![
            Device::new("d1", "thermostat", Some(1)).with_network_name("home"),
            Device::new("d2", "thermostat", Some(2)).with_network_name("office"),
            Device::new("d3", "camera", None),
        ];

        let all = count_devices(&devices, &CountDeviceRequest::default());
        assert_eq!(all, 3);

        let by_name = count_devices(
            &devices,
            &CountDeviceRequest {
                name: Some("thermostat".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_name, 2);

        let by_network = count_devices(
            &devices,
            &CountDeviceRequest {
                network_id: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(by_network, 1);

        let by_pattern = count_devices(
            &devices,
            &CountDeviceRequest {
                name_pattern: Some("cam".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_pattern, 1);

        let by_network_name = count_devices(
            &devices,
            &CountDeviceRequest {
                network_name: Some("office".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_network_name, 1);

        // A device with no network never matches a network-name filter.
        let unattached = count_devices(
            &devices,
            &CountDeviceRequest {
                network_name: Some("warehouse".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(unattached, 0);
    }

    #[tokio::test]
    async fn test_resolver_visibility() {
        let resolver = MemoryDeviceResolver::new()
            .with_device(Device::new("d1", "thermostat", Some(1)))
            .with_device(Device::new("d2", "camera", Some(1)))
            .grant("alice", "d1")
            .grant_all("admin");

        let alice = Principal::new("alice");
        let admin = Principal::new("admin");
        let bob = Principal::new("bob");

        assert!(resolver.find_device("d1", &alice).await.unwrap().is_some());
        assert!(resolver.find_device("d2", &alice).await.unwrap().is_none());
        assert!(resolver.find_device("d2", &admin).await.unwrap().is_some());
        assert!(resolver.find_device("d1", &bob).await.unwrap().is_none());

        let all_for_admin = resolver.visible_devices(&[], &admin).await.unwrap();
        assert_eq!(all_for_admin.len(), 2);

        let requested = vec!["d1".to_string(), "d2".to_string()];
        let subset_for_alice = resolver.visible_devices(&requested, &alice).await.unwrap();
        assert_eq!(subset_for_alice.len(), 1);
        assert_eq!(subset_for_alice[0].device_id, "d1");
    }
}
