use thiserror::Error;

use crate::model::{ConnectionId, ConnectionState, RoomId};

/// Everything that can go wrong on an initiating call. Fan-out failures
/// on individual recipients are logged and swallowed instead, so one dead
/// peer never fails a whole broadcast.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("unknown connection {0}")]
    NotFound(ConnectionId),

    #[error("{op} not allowed while connection {id} is {state:?}")]
    InvalidState {
        op: &'static str,
        id: ConnectionId,
        state: ConnectionState,
    },

    #[error("connection {0} is not an open member of room {1}")]
    Forbidden(ConnectionId, RoomId),

    #[error("pub/sub bridge unavailable: {0}")]
    BridgeUnavailable(String),
}
