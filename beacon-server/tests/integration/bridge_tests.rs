use serde_json::json;

use beacon_core::{RoomId, SignalKind, SignalMessage, Transport};
use beacon_server::LocalBus;

use crate::integration::{init_tracing, join_peer, spawn_relay, test_config};

#[tokio::test]
async fn message_crosses_the_bridge_without_duplication() {
    init_tracing();
    let bus = LocalBus::new();
    let relay_a = spawn_relay(&bus, test_config());
    let relay_b = spawn_relay(&bus, test_config());

    let (p1, mut cap1) = join_peer(&relay_a, Transport::Sse, "abc").await;
    let (p2, mut cap2) = join_peer(&relay_b, Transport::Socket, "abc").await;

    // The join on process B reaches process A through the bridge.
    let join = cap1.expect_kind(SignalKind::Join).await;
    assert_eq!(join.sender_id, p2);

    relay_a
        .publish(SignalMessage::new(
            RoomId::from("abc"),
            p1,
            SignalKind::Offer,
            json!("sdp-1"),
        ))
        .await
        .expect("publish failed");

    let offer = cap2.expect_kind(SignalKind::Offer).await;
    assert_eq!(offer.sender_id, p1);
    assert_eq!(offer.payload, json!("sdp-1"));

    // No duplicate on B, no echo back to A.
    cap2.expect_silence(150).await;
    cap1.expect_silence(150).await;
}

#[tokio::test]
async fn local_members_never_see_bridge_echoes() {
    init_tracing();
    let bus = LocalBus::new();
    let relay_a = spawn_relay(&bus, test_config());
    let relay_b = spawn_relay(&bus, test_config());

    let (p1, _cap1) = join_peer(&relay_a, Transport::Socket, "abc").await;
    let (_p2, mut cap2) = join_peer(&relay_a, Transport::Sse, "abc").await;
    let (_p3, mut cap3) = join_peer(&relay_b, Transport::Socket, "abc").await;

    relay_a
        .publish(SignalMessage::new(
            RoomId::from("abc"),
            p1,
            SignalKind::Offer,
            json!("sdp-1"),
        ))
        .await
        .expect("publish failed");

    // One copy locally, one copy remotely.
    cap2.expect_kind(SignalKind::Offer).await;
    cap2.expect_silence(150).await;
    cap3.expect_kind(SignalKind::Offer).await;
    cap3.expect_silence(150).await;
}

#[tokio::test]
async fn disconnect_propagates_across_processes() {
    init_tracing();
    let bus = LocalBus::new();
    let relay_a = spawn_relay(&bus, test_config());
    let relay_b = spawn_relay(&bus, test_config());

    let (p1, mut cap1) = join_peer(&relay_a, Transport::Socket, "abc").await;
    let (p2, mut cap2) = join_peer(&relay_b, Transport::Sse, "abc").await;

    // Wait until A knows about p2 so the ordering below is fixed.
    let join = cap1.expect_kind(SignalKind::Join).await;
    assert_eq!(join.sender_id, p2);

    relay_a.disconnect(p1).await;

    let leave = cap2.expect_kind(SignalKind::Leave).await;
    assert_eq!(leave.sender_id, p1);
}

#[tokio::test]
async fn subscriptions_are_refcounted_per_process() {
    init_tracing();
    let bus = LocalBus::new();
    let relay_a = spawn_relay(&bus, test_config());
    let relay_b = spawn_relay(&bus, test_config());
    let room = RoomId::from("abc");

    let (p1, _cap1) = join_peer(&relay_a, Transport::Socket, "abc").await;
    let (p2, _cap2) = join_peer(&relay_a, Transport::Sse, "abc").await;
    let (p3, _cap3) = join_peer(&relay_b, Transport::Socket, "abc").await;

    // One subscription per process, not per connection.
    assert_eq!(bus.subscriber_count(&room), 2);

    relay_a.leave(p1).await.expect("leave failed");
    assert_eq!(bus.subscriber_count(&room), 2);

    relay_a.disconnect(p2).await;
    assert_eq!(bus.subscriber_count(&room), 1);

    relay_b.disconnect(p3).await;
    assert_eq!(bus.subscriber_count(&room), 0);
}
