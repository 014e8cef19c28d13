//! # hivelink
//!
//! Notification delivery core for an IoT device-management backend.
//! Devices emit timestamped notifications; clients either fetch history or
//! long-poll until a matching new notification arrives or a timeout
//! elapses.
//!
//! ## Design Goals
//! - Decouple callers from the backend worker through a correlation layer
//!   of single-resolution reply futures
//! - Deliver at most one pushed notification per subscription, racing
//!   correctly against a concurrent historical lookup and a timeout
//! - Bound registry memory to the number of truly in-flight polls by
//!   deregistering on every exit path
//!
//! ## Module Structure
//!
//! - [`model`] - notification, device and principal value types
//! - [`rpc`] - action envelopes and the correlation client
//! - [`subscription`] - filters and the pending-subscription registry
//! - [`service`] - the notification orchestrator and long-poll protocol
//! - [`auth`] - the permission-filtered device lookup seam
//! - [`backend`] - in-memory worker and resolver (feature `mock`, default)
//! - [`config`] / [`error`] - runtime tuning and the error taxonomy

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod model;
pub mod rpc;
pub mod service;
pub mod subscription;

pub use config::HivelinkConfig;
pub use error::{HiveError, HiveResult};
pub use model::{Device, Notification, NotificationSubmission, Principal};
pub use service::NotificationService;
pub use subscription::{SubscriptionFilter, SubscriptionRegistry};
