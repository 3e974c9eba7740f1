use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::model::connection::ConnectionId;
use crate::model::room::RoomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    Join,
    Leave,
    Error,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
            SignalKind::Join => "join",
            SignalKind::Leave => "leave",
            SignalKind::Error => "error",
        }
    }
}

/// One signaling message routed through the relay. The payload is opaque:
/// the relay never inspects WebRTC semantics, only routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMessage {
    pub room_id: RoomId,
    pub sender_id: ConnectionId,
    pub kind: SignalKind,
    pub payload: Value,
}

impl SignalMessage {
    pub fn new(room_id: RoomId, sender_id: ConnectionId, kind: SignalKind, payload: Value) -> Self {
        Self {
            room_id,
            sender_id,
            kind,
            payload,
        }
    }

    pub fn join(room_id: RoomId, sender_id: ConnectionId) -> Self {
        Self::new(room_id, sender_id, SignalKind::Join, Value::Null)
    }

    pub fn leave(room_id: RoomId, sender_id: ConnectionId) -> Self {
        Self::new(room_id, sender_id, SignalKind::Leave, Value::Null)
    }

    pub fn error(room_id: RoomId, sender_id: ConnectionId, reason: &str) -> Self {
        Self::new(room_id, sender_id, SignalKind::Error, json!({ "reason": reason }))
    }
}
