//! Request/reply correlation layer
//!
//! Decouples a caller issuing a typed action request from the backend
//! worker producing the reply at an unknown later time. The caller gets a
//! single-resolution future keyed by a correlation id; replies arriving on
//! the inbound channel are matched back to their pending call.
//!
//! ## Module Structure
//!
//! - [`envelope`] - Action tags, request/reply envelopes and typed bodies
//! - [`client`] - `RpcClient` with the pending-call index and dispatcher

pub mod client;
pub mod envelope;

pub use client::RpcClient;
pub use envelope::{
    Action, ActionReply, ActionRequest, CountDeviceRequest, CountDeviceResponse,
    NotificationInsertRequest, NotificationInsertResponse, NotificationSearchRequest,
    NotificationSearchResponse, ReplyStatus,
};
