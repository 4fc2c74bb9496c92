//! ---
//! vcb_section: "06-testing-qa"
//! vcb_subsection: "integration-tests"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "Wire round-trip tests across two binders on one bus."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use vcb_common::AppConfig;
use vcb_core::{ClusterBinder, StatePublisher};
use vcb_msg::{CentralScreen, ClusterState, VehicleType};
use vcb_transport::InMemoryBus;

const TOPIC: &str = "vehicle/parameters";

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.ingest.batch_timeout = Duration::from_millis(10);
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn published_snapshot_reaches_a_second_cluster_head() {
    let bus = Arc::new(InMemoryBus::default());
    let sender = ClusterBinder::new(config(), bus.clone()).start();
    let receiver = ClusterBinder::new(config(), bus.clone()).start();

    let state = ClusterState {
        vehicle_type: VehicleType::Electric,
        gear: 'R',
        speed: 66,
        cruise_control: true,
        cruise_control_speed: 80,
        rpm: 4.25,
        battery: 58,
        range_remaining: 240,
        temp_unit: 1,
        engine_temp: 92.5,
        economy: "18.3 km/L".to_owned(),
        ambient_temp_c: -4,
        share_location: true,
        central_screen: CentralScreen::Map,
        mode_top: "Track".to_owned(),
        mode_mid: "Eco".to_owned(),
        mode_bottom: "Comfort".to_owned(),
        speed_unit: "km/h".to_owned(),
    };

    assert!(sender.set_state(state.clone()).await);
    sleep(Duration::from_millis(100)).await;

    // every field encoded by the publisher was reproduced by the decoder
    assert_eq!(receiver.state(), state);

    sender.shutdown().await;
    receiver.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn key_value_push_updates_a_listening_binder() {
    let bus = Arc::new(InMemoryBus::default());
    let binder = ClusterBinder::new(config(), bus.clone()).start();
    let publisher = StatePublisher::new(bus.clone(), TOPIC, Duration::from_millis(200));

    assert!(publisher.publish_key_value("gear", 'P').await);
    assert!(publisher.publish_key_value("ambient", -12).await);
    sleep(Duration::from_millis(100)).await;

    let state = binder.state();
    assert_eq!(state.gear, 'P');
    assert_eq!(state.ambient_temp_c, -12);

    binder.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn caller_toggles_converge_via_bus_echo() {
    let bus = Arc::new(InMemoryBus::default());
    let binder = ClusterBinder::new(config(), bus.clone()).start();

    assert!(binder.toggle_share_location().await);
    sleep(Duration::from_millis(100)).await;
    assert!(binder.state().share_location);

    assert!(binder.toggle_share_location().await);
    sleep(Duration::from_millis(100)).await;
    assert!(!binder.state().share_location);

    binder.shutdown().await;
}
