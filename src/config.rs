//! Configuration for the notification delivery core
//!
//! Tuning knobs for the long-poll and correlation paths. Values deserialize
//! from TOML; every field has a documented default so an empty file is a
//! valid configuration.

use crate::error::{HiveError, HiveResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime tuning for the notification service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HivelinkConfig {
    /// Result limit applied to historical lookups when the caller does not
    /// supply one.
    #[serde(default = "default_take")]
    pub default_take: usize,

    /// Upper bound in seconds for a long-poll wait; requested timeouts are
    /// clamped to this value.
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Wait budget in seconds for a single correlation-layer call.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
}

fn default_take() -> usize {
    100
}

fn default_max_wait_secs() -> u64 {
    60
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

impl Default for HivelinkConfig {
    fn default() -> Self {
        Self {
            default_take: default_take(),
            max_wait_secs: default_max_wait_secs(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
        }
    }
}

impl HivelinkConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> HiveResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| HiveError::Config {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        toml::from_str(&raw).map_err(|e| HiveError::Config {
            reason: format!("failed to parse {}: {}", path.display(), e),
        })
    }
}
