//! ---
//! vcb_section: "03-transport"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "Bus transport abstraction and in-memory implementation."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Transport layer for the VCB binder.
//!
//! The binder never talks to a broker directly: it is handed a [`Transport`]
//! at composition time and only relies on this contract — deliver raw
//! payloads for topics matching a subscription filter, and attempt outbound
//! delivery reporting success or failure. [`InMemoryBus`] implements the
//! contract for tests, simulation, and single-process integration.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Shared result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Failures surfaced by transport implementations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport has been closed and accepts no further traffic.
    #[error("transport is closed")]
    Closed,
    /// A subscription could not be registered.
    #[error("subscription rejected: {0}")]
    SubscriptionRejected(String),
    /// Outbound delivery failed.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Opaque inbound payload plus receipt metadata.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Unique identifier for tracing and deduplication.
    pub id: Uuid,
    /// Topic the payload arrived on.
    pub source: String,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// Receipt timestamp.
    pub received_at: DateTime<Utc>,
}

impl RawMessage {
    /// Construct a message stamped with the current time.
    pub fn new(source: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            payload,
            received_at: Utc::now(),
        }
    }
}

/// Inbound message stream attached to one subscription filter.
#[derive(Debug)]
pub struct Subscription {
    filter: String,
    receiver: mpsc::Receiver<RawMessage>,
}

impl Subscription {
    /// The filter this subscription was registered with.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Wait for the next message. Returns `None` once the transport is closed
    /// and the queue has drained.
    pub async fn recv(&mut self) -> Option<RawMessage> {
        self.receiver.recv().await
    }

    /// Take an already-queued message without waiting.
    pub fn try_recv(&mut self) -> Option<RawMessage> {
        self.receiver.try_recv().ok()
    }
}

/// Transport abstraction the binder composes against.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Attempt delivery of an outbound payload. Resolves once the transport
    /// has accepted the message for every current consumer.
    async fn send(&self, destination: &str, payload: Vec<u8>) -> Result<()>;

    /// Register a subscription for topics matching `filter`.
    fn subscribe(&self, filter: &str) -> Result<Subscription>;

    /// Human-readable transport name for logging/metrics.
    fn name(&self) -> &'static str;
}

/// Match a topic against a wildcard-capable filter.
///
/// Segments are `/`-separated; `+` and `*` match exactly one segment; a
/// trailing `#` matches any remaining suffix, including an empty one.
pub fn filter_matches(filter: &str, topic: &str) -> bool {
    let mut filter_segments = filter.split('/');
    let mut topic_segments = topic.split('/');
    loop {
        match (filter_segments.next(), topic_segments.next()) {
            (Some("#"), _) => return true,
            (Some(wanted), Some(actual)) => {
                if wanted != "+" && wanted != "*" && wanted != actual {
                    return false;
                }
            }
            (Some(_), None) | (None, Some(_)) => return false,
            (None, None) => return true,
        }
    }
}

struct BusSubscriber {
    filter: String,
    sender: mpsc::Sender<RawMessage>,
}

/// In-process bus with bounded per-subscriber queues.
///
/// `send` suspends until every matching subscriber has accepted the message,
/// so a backed-up consumer applies backpressure to producers instead of
/// losing telemetry.
pub struct InMemoryBus {
    capacity: usize,
    subscribers: Mutex<Vec<BusSubscriber>>,
    closed: AtomicBool,
}

impl InMemoryBus {
    /// Create a bus whose subscriber queues hold `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            subscribers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Close the bus: subsequent sends and subscribes fail, and draining
    /// subscriptions terminate once their queues empty.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscribers.lock().clear();
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Transport for InMemoryBus {
    async fn send(&self, destination: &str, payload: Vec<u8>) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        // Snapshot matching senders first; holding the lock across an await
        // would wedge subscribe/close while a queue is full.
        let targets: Vec<mpsc::Sender<RawMessage>> = {
            let subscribers = self.subscribers.lock();
            subscribers
                .iter()
                .filter(|s| filter_matches(&s.filter, destination))
                .map(|s| s.sender.clone())
                .collect()
        };
        for sender in targets {
            let message = RawMessage::new(destination, payload.clone());
            if sender.send(message).await.is_err() {
                // receiver dropped; prune it and keep delivering
                self.subscribers
                    .lock()
                    .retain(|s| !s.sender.same_channel(&sender));
            }
        }
        Ok(())
    }

    fn subscribe(&self, filter: &str) -> Result<Subscription> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        if filter.trim().is_empty() {
            return Err(TransportError::SubscriptionRejected(
                "empty topic filter".to_owned(),
            ));
        }
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.subscribers.lock().push(BusSubscriber {
            filter: filter.to_owned(),
            sender,
        });
        Ok(Subscription {
            filter: filter.to_owned(),
            receiver,
        })
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn send_and_recv_roundtrip() {
        let bus = InMemoryBus::default();
        let mut sub = bus.subscribe("vehicle/parameters").expect("subscribe");

        bus.send("vehicle/parameters", b"speed-100".to_vec())
            .await
            .expect("send succeeds");

        let message = sub.recv().await.expect("message available");
        assert_eq!(message.source, "vehicle/parameters");
        assert_eq!(message.payload, b"speed-100");
    }

    #[tokio::test]
    async fn wildcard_filters_match_segments() {
        assert!(filter_matches("vehicle/+/telemetry", "vehicle/ecu1/telemetry"));
        assert!(filter_matches("vehicle/*/telemetry", "vehicle/ecu2/telemetry"));
        assert!(!filter_matches("vehicle/+/telemetry", "vehicle/telemetry"));
        assert!(filter_matches("vehicle/#", "vehicle/a/b/c"));
        assert!(filter_matches("#", "anything/at/all"));
        assert!(!filter_matches("vehicle/parameters", "vehicle/other"));
    }

    #[tokio::test]
    async fn unmatched_topics_are_not_delivered() {
        let bus = InMemoryBus::default();
        let mut sub = bus.subscribe("vehicle/parameters").expect("subscribe");

        bus.send("vehicle/diagnostics", b"rpm-1".to_vec())
            .await
            .expect("send succeeds");

        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn fan_out_reaches_every_matching_subscriber() {
        let bus = InMemoryBus::default();
        let mut first = bus.subscribe("vehicle/#").expect("subscribe");
        let mut second = bus.subscribe("vehicle/parameters").expect("subscribe");

        bus.send("vehicle/parameters", b"gear-D".to_vec())
            .await
            .expect("send succeeds");

        assert_eq!(first.recv().await.expect("first copy").payload, b"gear-D");
        assert_eq!(second.recv().await.expect("second copy").payload, b"gear-D");
    }

    #[tokio::test]
    async fn full_queue_applies_backpressure() {
        let bus = Arc::new(InMemoryBus::new(1));
        let mut sub = bus.subscribe("t").expect("subscribe");

        bus.send("t", b"1".to_vec()).await.expect("first fits");

        let blocked = {
            let bus = bus.clone();
            tokio::spawn(async move { bus.send("t", b"2".to_vec()).await })
        };
        // the second send must park rather than drop
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!blocked.is_finished());

        assert_eq!(sub.recv().await.expect("first message").payload, b"1");
        timeout(Duration::from_secs(1), blocked)
            .await
            .expect("send unblocks after drain")
            .expect("join")
            .expect("second send succeeds");
        assert_eq!(sub.recv().await.expect("second message").payload, b"2");
    }

    #[tokio::test]
    async fn closed_bus_rejects_traffic() {
        let bus = InMemoryBus::default();
        let mut sub = bus.subscribe("t").expect("subscribe");
        bus.close();

        assert!(matches!(
            bus.send("t", Vec::new()).await,
            Err(TransportError::Closed)
        ));
        assert!(matches!(bus.subscribe("t"), Err(TransportError::Closed)));
        // the draining subscription terminates
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn empty_filter_is_rejected() {
        let bus = InMemoryBus::default();
        assert!(matches!(
            bus.subscribe("  "),
            Err(TransportError::SubscriptionRejected(_))
        ));
    }
}
