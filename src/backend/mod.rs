//! Backend collaborators
//!
//! The real backend worker and device registry live outside this crate;
//! the `mock` feature (default) ships in-memory stand-ins for tests and
//! demos.

#[cfg(feature = "mock")]
pub mod memory;

#[cfg(feature = "mock")]
pub use memory::{spawn_worker, MemoryDeviceResolver, MemoryNotificationStore};
