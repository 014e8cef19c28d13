//! Notification orchestrator
//!
//! Public-facing service over the correlation layer and the subscription
//! registry: historical queries, single lookups, submission with live
//! push, and the long-poll coordination protocol.
//!
//! ## Module Structure
//!
//! - [`notification_service`] - `NotificationService` core and
//!   resource-level operations
//! - [`poll`] - long-poll coordination (subscribe-then-find race, timeout)
//! - [`sort`] - comparator construction and pagination

pub mod notification_service;
pub mod poll;
pub mod sort;

pub use notification_service::NotificationService;
pub use sort::{order_and_limit, SortField, SortOrder};
