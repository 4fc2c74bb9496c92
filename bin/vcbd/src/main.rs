//! ---
//! vcb_section: "05-daemon"
//! vcb_subsection: "binary"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "Binary entrypoint for the VCB daemon."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vcb_common::{init_tracing, AppConfig, LogFormat};
use vcb_core::ClusterBinder;
use vcb_transport::{InMemoryBus, Transport};

#[derive(Debug, Parser)]
#[command(author, version, about = "VCB daemon", long_about = None)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, help = "Override stdout log format")]
    log_format: Option<CliLogFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogFormat {
    StructuredJson,
    Pretty,
}

impl From<CliLogFormat> for LogFormat {
    fn from(value: CliLogFormat) -> Self {
        match value {
            CliLogFormat::StructuredJson => LogFormat::StructuredJson,
            CliLogFormat::Pretty => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the binder")]
    Run,
    #[command(about = "Run the binder with the synthetic telemetry feed enabled")]
    Simulate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/example.dev.toml"));
    candidates.push(PathBuf::from("configs/example.prod.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;
    if let Some(format) = cli.log_format {
        config.logging.format = format.into();
    }
    init_tracing("vcbd", &config.logging)?;
    info!(config_path = %loaded.source.display(), "configuration loaded");

    let force_feed = matches!(cli.command, Some(Commands::Simulate));
    run_daemon(config, force_feed).await
}

async fn run_daemon(config: AppConfig, force_feed: bool) -> Result<()> {
    let bus = Arc::new(InMemoryBus::new(config.transport.queue_capacity));
    let handle = ClusterBinder::new(config.clone(), bus.clone()).start();
    if !handle.feed_online() {
        warn!("running without an inbound feed; state stays at defaults until set by callers");
    }

    let (feed_stop, _) = broadcast::channel(1);
    let feed_task: Option<JoinHandle<()>> = if force_feed || config.feed.enabled {
        info!(interval = ?config.feed.interval, "synthetic telemetry feed enabled");
        Some(tokio::spawn(run_feed(
            bus.clone(),
            config.clone(),
            feed_stop.subscribe(),
        )))
    } else {
        None
    };

    info!("daemon running; waiting for termination signal");
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");

    let _ = feed_stop.send(());
    if let Some(task) = feed_task {
        if let Err(err) = task.await {
            warn!(error = %err, "feed task join error");
        }
    }
    let metrics = handle.metrics();
    let state = handle.state();
    info!(
        received = metrics.received,
        batches = metrics.batches,
        published = metrics.published,
        vehicle = %state.vehicle_type,
        speed = state.speed,
        "final ingest counters"
    );
    handle.shutdown().await;
    bus.close();
    Ok(())
}

/// Synthetic vehicle feed: ramps the speed up and down and publishes one
/// frame per interval onto the binder's inbound topic.
async fn run_feed(bus: Arc<InMemoryBus>, config: AppConfig, mut stop: broadcast::Receiver<()>) {
    let topic = config.transport.inbound_filter.clone();
    let step = config.feed.speed_step.max(1);
    let mut speed = 0i32;
    let mut direction = 1i32;
    let mut ticker = tokio::time::interval(config.feed.interval);

    loop {
        tokio::select! {
            _ = stop.recv() => {
                debug!("feed shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                speed += step * direction;
                if speed >= 100 {
                    direction = -1;
                } else if speed <= 0 {
                    direction = 1;
                }
                let payload = serde_json::json!({ "Speed": speed }).to_string().into_bytes();
                match bus.send(&topic, payload).await {
                    Ok(()) => debug!(speed, "synthetic frame published"),
                    Err(err) => warn!(error = %err, "synthetic frame rejected"),
                }
            }
        }
    }
}
