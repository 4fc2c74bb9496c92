//! ---
//! vcb_section: "02-wire-vocabulary"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "Cluster state model and payload codecs."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
#![warn(missing_docs)]

pub mod codec;
pub mod state;
pub mod update;

pub use codec::{
    encode_key_value, encode_state_json, JsonDecoder, KeyValueDecoder, PayloadCodec,
    PayloadDecoder,
};
pub use state::{CentralScreen, ClusterState, VehicleType};
pub use update::{FieldKey, FieldUpdate, FieldValue};
