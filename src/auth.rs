//! Permission-filtered device lookup
//!
//! The notification service consumes authorization as an opaque principal
//! plus this resolver trait. How visibility is decided (networks, grants,
//! tokens) is the collaborator's concern.

use crate::error::HiveResult;
use crate::model::{Device, Principal};
use async_trait::async_trait;

/// Resolves which devices a principal may observe.
#[async_trait]
pub trait DeviceResolver: Send + Sync {
    /// Look up a single device, returning `None` when it does not exist or
    /// is not visible to the principal.
    async fn find_device(&self, device_id: &str, principal: &Principal)
        -> HiveResult<Option<Device>>;

    /// Resolve the visible subset of the requested devices. An empty
    /// request means every device the principal may observe.
    async fn visible_devices(
        &self,
        requested: &[String],
        principal: &Principal,
    ) -> HiveResult<Vec<Device>>;
}
