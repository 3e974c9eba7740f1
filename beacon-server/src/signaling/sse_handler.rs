use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::sse::{Event, Sse};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use beacon_core::{ConnectionId, RoomId, SignalKind, SignalMessage, Transport};

use crate::app::{ApiError, AppState};
use crate::signaling::RelayService;

/// Closes the connection when the response stream is dropped; the stream
/// going away (client disconnect or write failure) is the only close
/// signal an SSE response gets.
struct StreamGuard {
    relay: Arc<RelayService>,
    id: ConnectionId,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let relay = self.relay.clone();
        let id = self.id;
        tokio::spawn(async move {
            relay.disconnect(id).await;
        });
    }
}

/// Long-lived push channel: one SSE event per signaling message, flushed
/// as it arrives, plus comment-only keep-alive frames so intermediary
/// proxies do not time the stream out.
pub async fn sse_handler(
    Path(room): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let relay = state.relay.clone();
    let (tx, rx) = relay.outbound_channel();
    let id = relay
        .admit(Transport::Sse, tx, Some(RoomId::from(room)))
        .await?;
    info!("SSE stream opened for {}", id);

    // The client learns its connection id from the first frame and quotes
    // it in every companion POST.
    let welcome = Event::default()
        .event("welcome")
        .data(serde_json::json!({ "connectionId": id }).to_string());

    let guard = StreamGuard {
        relay: relay.clone(),
        id,
    };
    let heartbeat = tokio::time::interval(relay.config().heartbeat_interval);

    let signals = stream::unfold(
        (rx, heartbeat, relay, guard),
        |(mut rx, mut heartbeat, relay, guard)| async move {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => Some((signal_event(&msg), (rx, heartbeat, relay, guard))),
                    // The registry dropped our sender: connection closed.
                    None => None,
                },
                _ = heartbeat.tick() => {
                    // An emitted heartbeat means the response is still
                    // being polled; count it as outbound activity.
                    relay.touch(guard.id);
                    let frame = Event::default().comment("keep-alive");
                    Some((frame, (rx, heartbeat, relay, guard)))
                }
            }
        },
    );

    let stream = stream::once(async move { welcome })
        .chain(signals)
        .map(Ok::<_, Infallible>);
    Ok(Sse::new(stream))
}

fn signal_event(msg: &SignalMessage) -> Event {
    let event = Event::default().event(msg.kind.as_str());
    match serde_json::to_string(msg) {
        Ok(data) => event.data(data),
        Err(e) => {
            warn!("Failed to serialize signal for SSE: {}", e);
            Event::default().event("error").data("{}")
        }
    }
}

/// Client -> server half of the SSE transport: one POST per message,
/// injected as if the owning connection had emitted it. The claimed id
/// must map to an open member of the path's room.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectedSignal {
    pub connection_id: ConnectionId,
    pub kind: SignalKind,
    #[serde(default)]
    pub payload: Value,
}

pub async fn post_signal_handler(
    Path(room): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<InjectedSignal>,
) -> Result<StatusCode, ApiError> {
    let msg = SignalMessage::new(
        RoomId::from(room),
        body.connection_id,
        body.kind,
        body.payload,
    );
    state.relay.publish(msg).await?;
    Ok(StatusCode::ACCEPTED)
}
