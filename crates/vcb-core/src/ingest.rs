//! ---
//! vcb_section: "01-state-binding"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "State binding runtime and lifecycle management."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, info, trace};
use vcb_msg::{FieldUpdate, PayloadCodec};
use vcb_transport::{RawMessage, Subscription};

use crate::reducer::reduce;
use crate::store::StateStore;

/// Snapshot of ingest counters used by diagnostics and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestMetrics {
    /// Raw messages taken off the queue.
    pub received: u64,
    /// Batches handed to the reducer.
    pub batches: u64,
    /// Snapshots accepted by the store.
    pub published: u64,
    /// Payloads that produced no field updates.
    pub discarded: u64,
}

pub(crate) struct Counters {
    received: AtomicU64,
    batches: AtomicU64,
    published: AtomicU64,
    discarded: AtomicU64,
}

impl Counters {
    pub(crate) fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            published: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    pub(crate) fn snapshot(&self) -> IngestMetrics {
        IngestMetrics {
            received: self.received.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Single-consumer loop draining the inbound subscription in batches.
///
/// The worker waits up to `batch_timeout` for a first message, greedily
/// drains whatever else is already queued (up to `batch_size`), and commits
/// the whole batch as one reducer pass — at most one snapshot publish per
/// batch. Decode and coercion failures are absorbed; nothing a producer
/// sends can terminate the loop. Shutdown is cooperative: the signal is
/// checked once per poll cycle and an in-flight batch always completes.
pub(crate) struct IngestWorker {
    subscription: Subscription,
    codec: PayloadCodec,
    store: StateStore,
    batch_size: usize,
    batch_timeout: Duration,
    counters: Arc<Counters>,
    shutdown: broadcast::Receiver<()>,
}

impl IngestWorker {
    pub(crate) fn new(
        subscription: Subscription,
        store: StateStore,
        batch_size: usize,
        batch_timeout: Duration,
        counters: Arc<Counters>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            subscription,
            codec: PayloadCodec::default(),
            store,
            batch_size: batch_size.max(1),
            batch_timeout,
            counters,
            shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(filter = self.subscription.filter(), "ingest worker started");
        loop {
            let first = tokio::select! {
                _ = self.shutdown.recv() => {
                    debug!("ingest shutdown signal received");
                    break;
                }
                received = timeout(self.batch_timeout, self.subscription.recv()) => {
                    match received {
                        Ok(Some(message)) => message,
                        Ok(None) => {
                            info!("inbound subscription closed; ingest worker exiting");
                            break;
                        }
                        // bounded wait elapsed with no traffic; poll again
                        Err(_) => continue,
                    }
                }
            };

            let mut batch = vec![first];
            while batch.len() < self.batch_size {
                match self.subscription.try_recv() {
                    Some(message) => batch.push(message),
                    None => break,
                }
            }
            self.process_batch(&batch);
        }
        debug!("ingest worker stopped");
    }

    fn process_batch(&self, batch: &[RawMessage]) {
        self.counters
            .received
            .fetch_add(batch.len() as u64, Ordering::Relaxed);

        let mut updates: Vec<FieldUpdate> = Vec::new();
        for message in batch {
            let decoded = self.codec.decode(&message.payload);
            if decoded.is_empty() {
                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                trace!(message_id = %message.id, source = %message.source, "payload produced no updates");
            } else {
                updates.extend(decoded);
            }
        }
        if updates.is_empty() {
            return;
        }

        self.counters.batches.fetch_add(1, Ordering::Relaxed);
        let update_count = updates.len();
        let published = self.store.update(|state| {
            let reduction = reduce(state, &updates);
            *state = reduction.next;
        });
        if published {
            self.counters.published.fetch_add(1, Ordering::Relaxed);
            debug!(
                messages = batch.len(),
                updates = update_count,
                "batch reduced and snapshot published"
            );
        } else {
            trace!(messages = batch.len(), "batch reduced with no state change");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::time::sleep;
    use vcb_transport::{InMemoryBus, Transport};

    use super::*;

    const TOPIC: &str = "vehicle/parameters";

    struct Rig {
        bus: Arc<InMemoryBus>,
        store: StateStore,
        counters: Arc<Counters>,
        shutdown: broadcast::Sender<()>,
    }

    fn rig(capacity: usize) -> (Rig, Subscription) {
        let bus = Arc::new(InMemoryBus::new(capacity));
        let subscription = bus.subscribe(TOPIC).expect("subscribe");
        let (shutdown, _) = broadcast::channel(4);
        (
            Rig {
                bus,
                store: StateStore::default(),
                counters: Arc::new(Counters::new()),
                shutdown,
            },
            subscription,
        )
    }

    fn worker(rig: &Rig, subscription: Subscription, batch_size: usize) -> IngestWorker {
        IngestWorker::new(
            subscription,
            rig.store.clone(),
            batch_size,
            Duration::from_millis(20),
            rig.counters.clone(),
            rig.shutdown.subscribe(),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn prefilled_queue_reduces_in_full_batches() {
        let (rig, subscription) = rig(64);
        for i in 0..30 {
            rig.bus
                .send(TOPIC, format!("speed-{i}").into_bytes())
                .await
                .expect("send");
        }

        let task = tokio::spawn(worker(&rig, subscription, 10).run());
        sleep(Duration::from_millis(100)).await;
        let _ = rig.shutdown.send(());
        task.await.expect("worker joins");

        let metrics = rig.counters.snapshot();
        assert_eq!(metrics.received, 30);
        // 30 already-queued messages drain as ceil(30 / 10) = 3 batches
        assert_eq!(metrics.batches, 3);
        assert_eq!(rig.store.current().speed, 29);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn malformed_payloads_never_stop_the_loop() {
        let (rig, subscription) = rig(64);
        let task = tokio::spawn(worker(&rig, subscription, 10).run());

        rig.bus
            .send(TOPIC, vec![0xff, 0xfe])
            .await
            .expect("send binary garbage");
        rig.bus
            .send(TOPIC, b"not a payload at all!!".to_vec())
            .await
            .expect("send text garbage");
        sleep(Duration::from_millis(60)).await;
        rig.bus
            .send(TOPIC, b"battery-42".to_vec())
            .await
            .expect("send valid");
        sleep(Duration::from_millis(60)).await;

        assert_eq!(rig.store.current().battery, 42);
        let metrics = rig.counters.snapshot();
        assert_eq!(metrics.discarded, 2);
        assert_eq!(metrics.published, 1);

        let _ = rig.shutdown.send(());
        task.await.expect("worker joins");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn whole_batch_commits_as_one_publish() {
        let (rig, subscription) = rig(64);
        for payload in ["speed-100", "rpm-2200", "gear-R"] {
            rig.bus
                .send(TOPIC, payload.as_bytes().to_vec())
                .await
                .expect("send");
        }

        let task = tokio::spawn(worker(&rig, subscription, 10).run());
        sleep(Duration::from_millis(80)).await;
        let _ = rig.shutdown.send(());
        task.await.expect("worker joins");

        let state = rig.store.current();
        assert_eq!(state.speed, 100);
        assert_eq!(state.rpm, 2200.0);
        assert_eq!(state.gear, 'R');
        let metrics = rig.counters.snapshot();
        assert_eq!(metrics.batches, 1);
        assert_eq!(metrics.published, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn repeated_value_is_not_republished() {
        let (rig, subscription) = rig(64);
        let task = tokio::spawn(worker(&rig, subscription, 10).run());

        rig.bus.send(TOPIC, b"speed-50".to_vec()).await.expect("send");
        sleep(Duration::from_millis(60)).await;
        rig.bus.send(TOPIC, b"speed-50".to_vec()).await.expect("send");
        sleep(Duration::from_millis(60)).await;

        let metrics = rig.counters.snapshot();
        assert_eq!(metrics.batches, 2);
        assert_eq!(metrics.published, 1);

        let _ = rig.shutdown.send(());
        task.await.expect("worker joins");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_stops_an_idle_worker() {
        let (rig, subscription) = rig(8);
        let task = tokio::spawn(worker(&rig, subscription, 4).run());
        sleep(Duration::from_millis(30)).await;
        let _ = rig.shutdown.send(());
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("worker exits promptly")
            .expect("worker joins");
    }
}
