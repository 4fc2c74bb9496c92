//! ---
//! vcb_section: "01-state-binding"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "State binding runtime and lifecycle management."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use vcb_common::AppConfig;
use vcb_msg::ClusterState;
use vcb_transport::Transport;

use crate::action::{step_set_speed, ClusterAction};
use crate::ingest::{Counters, IngestMetrics, IngestWorker};
use crate::publisher::StatePublisher;
use crate::store::StateStore;

/// Composition root for the state binder.
///
/// The transport is injected at construction time; `start` wires the
/// subscription, the ingest worker, the store, and the publisher together
/// and hands lifecycle control to the returned [`BinderHandle`].
pub struct ClusterBinder {
    config: AppConfig,
    transport: Arc<dyn Transport>,
}

impl ClusterBinder {
    /// Compose a binder against an explicit transport instance.
    pub fn new(config: AppConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Subscribe the inbound feed, spawn the ingest consumer, and return the
    /// running binder's handle.
    ///
    /// A rejected subscription is fatal for the inbound feed only: the
    /// failure is logged, `feed_online` reports `false`, and the handle keeps
    /// serving (stale) state and outbound publishes.
    pub fn start(self) -> BinderHandle {
        let store = StateStore::new(ClusterState::default());
        let counters = Arc::new(Counters::new());
        let (shutdown, _) = broadcast::channel(4);
        let publisher = StatePublisher::new(
            self.transport.clone(),
            self.config.transport.outbound_topic.clone(),
            self.config.transport.send_timeout,
        );

        let worker = match self.transport.subscribe(&self.config.transport.inbound_filter) {
            Ok(subscription) => {
                info!(
                    filter = %self.config.transport.inbound_filter,
                    transport = self.transport.name(),
                    "inbound feed subscribed"
                );
                let worker = IngestWorker::new(
                    subscription,
                    store.clone(),
                    self.config.ingest.batch_size,
                    self.config.ingest.batch_timeout,
                    counters.clone(),
                    shutdown.subscribe(),
                );
                Some(tokio::spawn(worker.run()))
            }
            Err(err) => {
                error!(
                    filter = %self.config.transport.inbound_filter,
                    transport = self.transport.name(),
                    error = %err,
                    "inbound subscription failed; binder keeps serving stale state"
                );
                None
            }
        };

        BinderHandle {
            store,
            publisher,
            counters,
            shutdown,
            worker,
        }
    }
}

/// Handle over a running binder: state reads, subscriptions, caller-driven
/// updates, and shutdown.
pub struct BinderHandle {
    store: StateStore,
    publisher: StatePublisher,
    counters: Arc<Counters>,
    shutdown: broadcast::Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl BinderHandle {
    /// Synchronous read of the latest snapshot.
    pub fn state(&self) -> ClusterState {
        self.store.current()
    }

    /// Observe the current snapshot and every subsequent accepted change.
    pub fn subscribe(&self) -> watch::Receiver<ClusterState> {
        self.store.subscribe()
    }

    /// Whether the inbound feed was successfully subscribed at startup.
    pub fn feed_online(&self) -> bool {
        self.worker.is_some()
    }

    /// Snapshot of the ingest counters.
    pub fn metrics(&self) -> IngestMetrics {
        self.counters.snapshot()
    }

    /// Publish the current snapshot with `speed` replaced.
    ///
    /// Caller updates travel over the bus rather than writing the store
    /// directly; the accepted change comes back through the inbound feed.
    pub async fn update_speed(&self, speed: i32) -> bool {
        let next = ClusterState {
            speed,
            ..self.state()
        };
        self.publisher.publish_state(&next).await
    }

    /// Publish the current snapshot with `rpm` replaced.
    pub async fn update_rpm(&self, rpm: i32) -> bool {
        let next = ClusterState {
            rpm: rpm as f32,
            ..self.state()
        };
        self.publisher.publish_state(&next).await
    }

    /// Publish the current snapshot with cruise control flipped.
    pub async fn toggle_cruise_control(&self) -> bool {
        let current = self.state();
        let next = ClusterState {
            cruise_control: !current.cruise_control,
            ..current
        };
        self.publisher.publish_state(&next).await
    }

    /// Publish the current snapshot with location sharing flipped.
    pub async fn toggle_share_location(&self) -> bool {
        let current = self.state();
        let next = ClusterState {
            share_location: !current.share_location,
            ..current
        };
        self.publisher.publish_state(&next).await
    }

    /// Replace the snapshot locally and publish it to the bus.
    pub async fn set_state(&self, next: ClusterState) -> bool {
        self.store.publish(next.clone());
        self.publisher.publish_state(&next).await
    }

    /// Dispatch one caller action. Matching is exhaustive; every variant
    /// reports delivery success like the underlying publish.
    pub async fn apply(&self, action: ClusterAction) -> bool {
        match action {
            ClusterAction::Speed(step) => {
                let current = self.state();
                let next = ClusterState {
                    cruise_control_speed: step_set_speed(current.cruise_control_speed, step),
                    ..current
                };
                self.publisher.publish_state(&next).await
            }
            ClusterAction::ToggleCruiseControl => self.toggle_cruise_control().await,
            ClusterAction::ToggleShareLocation => self.toggle_share_location().await,
            ClusterAction::ParkingSensor(sensor) => {
                let current = self.state();
                let next = ClusterState {
                    central_screen: sensor.screen(),
                    ..current
                };
                self.set_state(next).await
            }
        }
    }

    /// Signal the ingest worker to stop and wait for the in-flight batch to
    /// finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Some(worker) = self.worker {
            if let Err(err) = worker.await {
                warn!(error = %err, "ingest worker join error");
            }
        }
        info!("binder shutdown complete");
    }
}
