//! Device and principal value types

use serde::{Deserialize, Serialize};

/// A managed device, as resolved by the permission collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub device_id: String,
    pub name: String,
    /// Devices not attached to any network may not accept submissions.
    pub network_id: Option<i64>,
    #[serde(default)]
    pub network_name: Option<String>,
}

impl Device {
    pub fn new(device_id: impl Into<String>, name: impl Into<String>, network_id: Option<i64>) -> Self {
        Self {
            device_id: device_id.into(),
            name: name.into(),
            network_id,
            network_name: None,
        }
    }

    /// Attach the name of the owning network.
    pub fn with_network_name(mut self, network_name: impl Into<String>) -> Self {
        self.network_name = Some(network_name.into());
        self
    }
}

/// Opaque caller identity, threaded explicitly through every call
/// signature. Permission resolution happens in the [`DeviceResolver`]
/// collaborator, never here.
///
/// [`DeviceResolver`]: crate::auth::DeviceResolver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Principal {
    pub login: String,
}

impl Principal {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }
}
