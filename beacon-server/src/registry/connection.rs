use std::time::Instant;
use tokio::sync::mpsc;

use beacon_core::{ConnectionId, ConnectionState, RoomId, SignalMessage, Transport};

/// Live registry entry for one client connection. The outbound sender is
/// the connection's push channel; dropping it ends the adapter's stream.
pub(crate) struct ConnectionEntry {
    pub transport: Transport,
    pub state: ConnectionState,
    pub room: Option<RoomId>,
    pub tx: mpsc::Sender<SignalMessage>,
    pub last_activity: Instant,
}

impl ConnectionEntry {
    pub fn new(transport: Transport, tx: mpsc::Sender<SignalMessage>) -> Self {
        Self {
            transport,
            state: ConnectionState::Connecting,
            room: None,
            tx,
            last_activity: Instant::now(),
        }
    }
}

/// Snapshot of one room member, safe to use outside the registry lock.
#[derive(Clone)]
pub struct Member {
    pub id: ConnectionId,
    pub tx: mpsc::Sender<SignalMessage>,
}

/// What `close` released.
#[derive(Debug)]
pub struct ClosedConnection {
    pub transport: Transport,
    pub room: Option<RoomId>,
}
