//! ---
//! vcb_section: "01-state-binding"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "State binding runtime and lifecycle management."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Core state binder for the VCB workspace.
//!
//! The binder folds asynchronous, unordered, possibly-malformed bus messages
//! into one consistent, observable [`vcb_msg::ClusterState`] snapshot:
//! decoded updates flow through a batching ingest queue into a pure reducer,
//! accepted snapshots land in an observable store, and caller-driven changes
//! are published back onto the bus.

pub mod action;
pub mod binder;
pub mod ingest;
pub mod publisher;
pub mod reducer;
pub mod store;

pub use action::{ClusterAction, ParkingSensor, SpeedAction};
pub use binder::{BinderHandle, ClusterBinder};
pub use ingest::IngestMetrics;
pub use publisher::StatePublisher;
pub use reducer::{reduce, Reduction};
pub use store::StateStore;
