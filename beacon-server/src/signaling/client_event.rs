use serde::Deserialize;
use serde_json::Value;

use beacon_core::{RoomId, SignalKind};

/// Client -> server events on the socket transport. A closed set,
/// matched exhaustively at the adapter boundary; anything else is
/// rejected when the frame is parsed.
#[derive(Debug, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    Join { room_id: RoomId },
    Offer { payload: Value },
    Answer { payload: Value },
    IceCandidate { payload: Value },
    Leave,
}

impl ClientEvent {
    /// Signal kind for the payload-bearing events.
    pub fn kind(&self) -> Option<SignalKind> {
        match self {
            ClientEvent::Offer { .. } => Some(SignalKind::Offer),
            ClientEvent::Answer { .. } => Some(SignalKind::Answer),
            ClientEvent::IceCandidate { .. } => Some(SignalKind::IceCandidate),
            ClientEvent::Join { .. } | ClientEvent::Leave => None,
        }
    }
}
