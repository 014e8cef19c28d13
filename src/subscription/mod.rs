//! Subscription registry for long-poll push delivery
//!
//! A blocked poll registers a filter here and suspends on a one-shot
//! receiver. Every newly stored notification is matched against the active
//! filters; each match is delivered at most once, and a matched, cancelled
//! or expired subscription leaves the index immediately.
//!
//! ## Module Structure
//!
//! - [`filter`] - `SubscriptionFilter` and its matching rules
//! - [`registry`] - `SubscriptionRegistry` and the `Subscription` handle

pub mod filter;
pub mod registry;

pub use filter::SubscriptionFilter;
pub use registry::{Subscription, SubscriptionRegistry};
