use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tracing::{info, warn};

use beacon_core::{ConnectionId, RelayError, SignalKind, SignalMessage, Transport};

use crate::app::AppState;
use crate::signaling::{ClientEvent, RelayService};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.relay.clone()))
}

async fn handle_socket(socket: WebSocket, relay: Arc<RelayService>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = relay.outbound_channel();

    let id = match relay.admit(Transport::Socket, tx, None).await {
        Ok(id) => id,
        Err(e) => {
            warn!("Socket admission failed: {}", e);
            return;
        }
    };
    info!("New socket connection: {}", id);

    // Welcome completes the handshake; membership still waits for an
    // explicit join event.
    let welcome =
        serde_json::json!({ "event": "welcome", "data": { "connectionId": id } }).to_string();
    if sender.send(Message::Text(welcome.into())).await.is_err() {
        relay.disconnect(id).await;
        return;
    }
    if let Err(e) = relay.activate(id) {
        warn!("Activation failed for {}: {}", id, e);
        relay.disconnect(id).await;
        return;
    }

    let heartbeat_interval = relay.config().heartbeat_interval;
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(heartbeat_interval);
        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    let Ok(text) = serde_json::to_string(&msg) else { continue };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();
        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                relay.touch(id);
                match msg {
                    Message::Text(text) => handle_event(&relay, id, &text).await,
                    Message::Close(_) => break,
                    // Pongs and pings only refresh activity.
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    relay.disconnect(id).await;
    info!("Socket disconnected: {}", id);
}

async fn handle_event(relay: &Arc<RelayService>, id: ConnectionId, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("Invalid event from {}: {}", id, e);
            relay.send_error(id, "unrecognized event");
            return;
        }
    };

    match event {
        ClientEvent::Join { room_id } => {
            if let Err(e) = relay.join(id, room_id).await {
                warn!("Join failed for {}: {}", id, e);
                relay.send_error(id, "join failed");
            }
        }
        ClientEvent::Leave => {
            if let Err(e) = relay.leave(id).await {
                warn!("Leave failed for {}: {}", id, e);
            }
        }
        ClientEvent::Offer { payload } => signal(relay, id, SignalKind::Offer, payload).await,
        ClientEvent::Answer { payload } => signal(relay, id, SignalKind::Answer, payload).await,
        ClientEvent::IceCandidate { payload } => {
            signal(relay, id, SignalKind::IceCandidate, payload).await
        }
    }
}

async fn signal(relay: &Arc<RelayService>, id: ConnectionId, kind: SignalKind, payload: Value) {
    // Join-before-use: no implicit membership from the handshake.
    let Some(room) = relay.room_of(id) else {
        relay.send_error(id, "not in a room");
        return;
    };

    match relay.publish(SignalMessage::new(room, id, kind, payload)).await {
        Ok(()) => {}
        Err(RelayError::BridgeUnavailable(reason)) => {
            warn!("Cross-process fan-out degraded: {}", reason);
            relay.send_error(id, "bridge unavailable");
        }
        Err(e) => {
            warn!("Publish failed for {}: {}", id, e);
            relay.send_error(id, "publish rejected");
        }
    }
}
