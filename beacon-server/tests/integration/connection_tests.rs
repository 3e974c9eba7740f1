use std::time::Duration;

use beacon_core::{SignalKind, Transport};
use beacon_server::{LocalBus, RelayConfig};

use crate::integration::{init_tracing, join_peer, single_relay, spawn_relay, test_config};

#[tokio::test]
async fn close_broadcasts_exactly_one_leave() {
    init_tracing();
    let relay = single_relay();

    let (_c1, mut cap1) = join_peer(&relay, Transport::Sse, "room-42").await;
    let (c2, _cap2) = join_peer(&relay, Transport::Socket, "room-42").await;

    cap1.expect_kind(SignalKind::Join).await;

    relay.disconnect(c2).await;
    // Idempotent: the second close must not produce a second leave.
    relay.disconnect(c2).await;

    let leave = cap1.expect_kind(SignalKind::Leave).await;
    assert_eq!(leave.sender_id, c2);
    cap1.expect_silence(150).await;

    assert_eq!(relay.connection_count(), 1);
    assert_eq!(relay.room_counts().len(), 1);
}

#[tokio::test]
async fn close_ends_the_outbound_stream() {
    init_tracing();
    let relay = single_relay();

    let (c1, mut cap1) = join_peer(&relay, Transport::Sse, "room-42").await;

    relay.disconnect(c1).await;
    assert!(cap1.closed().await, "sender must be dropped on close");
    assert_eq!(relay.connection_count(), 0);
    assert!(relay.room_counts().is_empty());
}

#[tokio::test]
async fn idle_connection_is_reaped() {
    init_tracing();
    let relay = spawn_relay(
        &LocalBus::new(),
        RelayConfig {
            heartbeat_interval: Duration::from_millis(25),
            idle_timeout: Duration::from_millis(150),
            ..test_config()
        },
    );

    let (c1, mut cap1) = join_peer(&relay, Transport::Sse, "room-42").await;
    let (c2, _cap2) = join_peer(&relay, Transport::Socket, "room-42").await;
    cap1.expect_kind(SignalKind::Join).await;

    // c1 stays active; c2 goes silent and must be evicted.
    let keeper = tokio::spawn({
        let relay = relay.clone();
        async move {
            loop {
                relay.touch(c1);
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        }
    });

    let leave = cap1.expect_kind(SignalKind::Leave).await;
    assert_eq!(leave.sender_id, c2);
    keeper.abort();

    assert_eq!(relay.connection_count(), 1);
}
