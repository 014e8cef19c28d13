//! Correlation client with a pending-call index
//!
//! `call` registers a pending entry before the envelope reaches the
//! transport, then suspends on a oneshot slot. A dispatcher task drains
//! inbound replies and resolves slots by correlation id. The entry is
//! removed exactly once, by whichever side gets there first; the losing
//! side of a reply/timeout race finds nothing to do.

use crate::error::{HiveError, HiveResult};
use crate::model::Principal;
use crate::rpc::envelope::{Action, ActionReply, ActionRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use uuid::Uuid;

/// Single-resolution result slot for one in-flight call.
struct PendingCall {
    slot: oneshot::Sender<ActionReply>,
    created_at: Instant,
}

/// Client side of the correlation layer.
pub struct RpcClient {
    pending: Arc<Mutex<HashMap<Uuid, PendingCall>>>,
    outbound: mpsc::UnboundedSender<ActionRequest>,
}

impl RpcClient {
    /// Create a client writing requests to the given transport.
    pub fn new(outbound: mpsc::UnboundedSender<ActionRequest>) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            outbound,
        }
    }

    /// Spawn the dispatcher that matches inbound replies to pending calls.
    /// Runs until the inbound channel closes.
    pub fn start_reply_dispatcher(
        &self,
        mut inbound: mpsc::UnboundedReceiver<ActionReply>,
    ) -> JoinHandle<()> {
        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            while let Some(reply) = inbound.recv().await {
                Self::resolve(&pending, reply).await;
            }
            log::debug!("reply channel closed, dispatcher stopping");
        })
    }

    /// Resolve one inbound reply against the pending index.
    async fn resolve(pending: &Mutex<HashMap<Uuid, PendingCall>>, reply: ActionReply) {
        let correlation_id = reply.correlation_id;
        let entry = { pending.lock().await.remove(&correlation_id) };
        match entry {
            Some(call) => {
                let waited = call.created_at.elapsed();
                if call.slot.send(reply).is_ok() {
                    log::debug!("reply {} matched after {:?}", correlation_id, waited);
                } else {
                    // Caller already gave up between removal and delivery.
                    log::debug!("reply {} arrived for an abandoned call", correlation_id);
                }
            }
            // Late reply after the timeout side already removed the entry.
            None => log::debug!("unmatched reply for correlation id {}", correlation_id),
        }
    }

    /// Send a typed action request and wait for its reply.
    ///
    /// The pending entry is registered before the envelope is handed to the
    /// transport, so a reply can never race ahead of its own registration.
    /// Exceeding `wait` removes the entry and fails with
    /// [`HiveError::Timeout`].
    pub async fn call(
        &self,
        action: Action,
        body: Value,
        principal: Option<Principal>,
        wait: Duration,
    ) -> HiveResult<ActionReply> {
        let request = ActionRequest::new(action, body, principal);
        let correlation_id = request.correlation_id;
        let (tx, rx) = oneshot::channel();

        {
            let mut pending = self.pending.lock().await;
            pending.insert(
                correlation_id,
                PendingCall {
                    slot: tx,
                    created_at: Instant::now(),
                },
            );
        }

        if self.outbound.send(request).is_err() {
            self.pending.lock().await.remove(&correlation_id);
            return Err(HiveError::Upstream {
                reason: "backend transport closed".to_string(),
            });
        }

        match timeout(wait, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => {
                // Slot dropped without a send; dispatcher shut down.
                self.pending.lock().await.remove(&correlation_id);
                Err(HiveError::Upstream {
                    reason: format!("reply slot for {} closed without a reply", correlation_id),
                })
            }
            Err(_) => {
                self.pending.lock().await.remove(&correlation_id);
                log::warn!(
                    "{} request {} timed out after {:?}",
                    action.as_str(),
                    correlation_id,
                    wait
                );
                Err(HiveError::Timeout {
                    reason: format!(
                        "no reply to {} request within {:?}",
                        action.as_str(),
                        wait
                    ),
                })
            }
        }
    }

    /// Number of calls currently awaiting a reply.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
