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

use tokio::sync::watch;
use vcb_msg::ClusterState;

/// Observable holder of the single current [`ClusterState`].
///
/// The snapshot lives in a `watch` channel: one atomically-swapped current
/// value, synchronous reads from any thread, and subscribers that observe
/// the value at subscription time plus every accepted change in publish
/// order. Writes funnel through [`StateStore::publish`] and
/// [`StateStore::update`], both of which install a new snapshot only when it
/// structurally differs from the current one.
#[derive(Debug, Clone)]
pub struct StateStore {
    sender: Arc<watch::Sender<ClusterState>>,
}

impl StateStore {
    /// Create a store seeded with the given snapshot.
    pub fn new(initial: ClusterState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Synchronous read of the latest snapshot.
    pub fn current(&self) -> ClusterState {
        self.sender.borrow().clone()
    }

    /// Register an observer. The receiver sees the current value immediately
    /// via `borrow` and is notified of every subsequent accepted publish.
    pub fn subscribe(&self) -> watch::Receiver<ClusterState> {
        self.sender.subscribe()
    }

    /// Install `next` as the current snapshot if it differs from the current
    /// one. Returns whether a change was published.
    pub fn publish(&self, next: ClusterState) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Atomic read-modify-write against the current snapshot.
    ///
    /// The closure runs under the channel's write serialisation, so updates
    /// derived from the current value cannot be lost to a concurrent write.
    /// Subscribers are only notified when the mutation changed the snapshot.
    pub fn update(&self, mutate: impl FnOnce(&mut ClusterState)) -> bool {
        self.sender.send_if_modified(|current| {
            let previous = current.clone();
            mutate(current);
            *current != previous
        })
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(ClusterState::default())
    }
}
