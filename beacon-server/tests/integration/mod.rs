pub mod bridge_tests;
pub mod connection_tests;
pub mod status_tests;

use std::sync::Arc;
use std::time::Duration;

use tracing::Level;
use uuid::Uuid;

use beacon_core::{ConnectionId, RoomId, Transport};
use beacon_server::{LocalBus, RelayConfig, RelayService};

use crate::utils::SignalCapture;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> RelayConfig {
    RelayConfig {
        channel_capacity: 16,
        heartbeat_interval: Duration::from_millis(50),
        idle_timeout: Duration::from_secs(30),
        ..RelayConfig::default()
    }
}

/// One relay wired to the bus, standing in for one server process.
pub fn spawn_relay(bus: &LocalBus, config: RelayConfig) -> Arc<RelayService> {
    let origin = Uuid::new_v4();
    let (bridge, bridge_rx) = bus.attach(origin);
    RelayService::start(config, origin, Arc::new(bridge), bridge_rx)
}

pub fn single_relay() -> Arc<RelayService> {
    spawn_relay(&LocalBus::new(), test_config())
}

/// Admits, activates and joins a connection, returning its capture side.
pub async fn join_peer(
    relay: &Arc<RelayService>,
    transport: Transport,
    room: &str,
) -> (ConnectionId, SignalCapture) {
    let (tx, rx) = relay.outbound_channel();
    let id = relay
        .admit(transport, tx, Some(RoomId::from(room)))
        .await
        .expect("admission failed");
    (id, SignalCapture::new(rx))
}
