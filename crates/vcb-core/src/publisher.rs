//! ---
//! vcb_section: "01-state-binding"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "State binding runtime and lifecycle management."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};
use vcb_msg::{encode_key_value, encode_state_json, ClusterState};
use vcb_transport::Transport;

/// Serialises snapshots into the wire vocabulary and hands them to the
/// transport for delivery.
///
/// Full snapshots travel as structured JSON so they round-trip through the
/// inbound decoder; single-field pushes use the legacy `key-value` text.
/// Both paths never fail: every transport or serialisation problem is
/// logged and converted into a `false` result. Retrying is the caller's
/// decision.
pub struct StatePublisher {
    transport: Arc<dyn Transport>,
    destination: String,
    send_timeout: Duration,
}

impl StatePublisher {
    /// Construct a publisher bound to one outbound topic.
    pub fn new(
        transport: Arc<dyn Transport>,
        destination: impl Into<String>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            destination: destination.into(),
            send_timeout,
        }
    }

    /// Publish a full snapshot as structured JSON.
    pub async fn publish_state(&self, state: &ClusterState) -> bool {
        let json = encode_state_json(state);
        let payload = match serde_json::to_vec(&json) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to serialise snapshot");
                return false;
            }
        };
        self.deliver(payload).await
    }

    /// Publish one field in the legacy key-value vocabulary.
    pub async fn publish_key_value(&self, key: &str, value: impl Display) -> bool {
        self.deliver(encode_key_value(key, value).into_bytes()).await
    }

    async fn deliver(&self, payload: Vec<u8>) -> bool {
        let delivery = timeout(
            self.send_timeout,
            self.transport.send(&self.destination, payload),
        )
        .await;
        match delivery {
            Ok(Ok(())) => {
                debug!(
                    destination = %self.destination,
                    transport = self.transport.name(),
                    "outbound message delivered"
                );
                true
            }
            Ok(Err(err)) => {
                warn!(
                    destination = %self.destination,
                    transport = self.transport.name(),
                    error = %err,
                    "outbound delivery failed"
                );
                false
            }
            Err(_) => {
                warn!(
                    destination = %self.destination,
                    transport = self.transport.name(),
                    timeout = ?self.send_timeout,
                    "outbound delivery timed out"
                );
                false
            }
        }
    }
}
