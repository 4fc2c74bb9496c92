//! ---
//! vcb_section: "04-configuration-logging"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "Shared configuration and logging primitives."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
//! Shared primitives for the VCB workspace: configuration loading with
//! environment override, validation, and tracing initialisation.

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, FeedConfig, IngestConfig, LoadedAppConfig, LoggingConfig, TransportConfig,
};
pub use logging::{init_tracing, LogFormat};
