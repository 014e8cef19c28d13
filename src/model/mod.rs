//! Domain model for the notification delivery core
//!
//! Immutable value types shared by the correlation layer, the subscription
//! registry and the notification service.

pub mod device;
pub mod notification;

pub use device::{Device, Principal};
pub use notification::{Notification, NotificationSubmission};
