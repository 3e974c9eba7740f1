use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use beacon_core::Transport;
use beacon_server::{AppState, signaling::status_handler};

use crate::integration::{init_tracing, join_peer, single_relay};

#[tokio::test]
async fn status_reports_rooms_and_member_counts() {
    init_tracing();
    let relay = single_relay();
    let port = relay.config().port;

    let (_a, _cap_a) = join_peer(&relay, Transport::Sse, "room-42").await;
    let (_b, _cap_b) = join_peer(&relay, Transport::Socket, "room-42").await;
    let (_c, _cap_c) = join_peer(&relay, Transport::Socket, "lobby").await;

    let state = Arc::new(AppState { relay });
    let response = status_handler(State(state)).await.0;

    assert_eq!(response.status, "online");
    assert_eq!(response.port, port);

    let counts: HashMap<_, _> = response
        .namespaces
        .iter()
        .map(|ns| (ns.name.as_str(), ns.connected))
        .collect();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts["room-42"], 2);
    assert_eq!(counts["lobby"], 1);
}
