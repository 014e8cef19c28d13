//! Shared test fixture wiring the notification service to the in-memory
//! backend worker.

use hivelink::backend::{spawn_worker, MemoryDeviceResolver, MemoryNotificationStore};
use hivelink::rpc::RpcClient;
use hivelink::subscription::SubscriptionRegistry;
use hivelink::{Device, HivelinkConfig, NotificationService, Principal};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Service, registry and store assembled over in-memory collaborators.
///
/// Fixture devices: `d1` (network 1), `d2` (network 1), `d3` (no network).
/// Principals: `alice` sees d1, d2 and d3, `admin` sees everything, `bob`
/// sees nothing.
pub struct ServiceFixture {
    pub service: Arc<NotificationService>,
    pub registry: Arc<SubscriptionRegistry>,
    pub store: Arc<MemoryNotificationStore>,
}

impl ServiceFixture {
    pub fn new() -> Self {
        Self::with_config(HivelinkConfig::default())
    }

    pub fn with_config(config: HivelinkConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let resolver = MemoryDeviceResolver::new()
            .with_device(Device::new("d1", "thermostat", Some(1)))
            .with_device(Device::new("d2", "camera", Some(1)))
            .with_device(Device::new("d3", "orphan", None))
            .grant("alice", "d1")
            .grant("alice", "d2")
            .grant("alice", "d3")
            .grant_all("admin");
        let devices = resolver.devices();

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();

        let store = Arc::new(MemoryNotificationStore::new());
        spawn_worker(Arc::clone(&store), devices, request_rx, reply_tx);

        let rpc = Arc::new(RpcClient::new(request_tx));
        rpc.start_reply_dispatcher(reply_rx);

        let registry = Arc::new(SubscriptionRegistry::new());
        let service = Arc::new(NotificationService::new(
            rpc,
            Arc::clone(&registry),
            Arc::new(resolver),
            config,
        ));

        Self {
            service,
            registry,
            store,
        }
    }

    pub fn alice() -> Principal {
        Principal::new("alice")
    }

    pub fn admin() -> Principal {
        Principal::new("admin")
    }

    pub fn bob() -> Principal {
        Principal::new("bob")
    }
}
