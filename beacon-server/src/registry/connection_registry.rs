use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::info;

use beacon_core::{ConnectionId, ConnectionState, RelayError, RoomId, SignalMessage, Transport};

use crate::registry::connection::{ClosedConnection, ConnectionEntry, Member};

#[derive(Default)]
struct RegistryIndex {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

/// Tracks live connections and the room each belongs to, transport
/// agnostic. Both indexes sit behind one mutex so join/leave/close can
/// never be observed half-applied; every read hands out a copy.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryIndex>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self) -> MutexGuard<'_, RegistryIndex> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn admit(&self, transport: Transport, tx: mpsc::Sender<SignalMessage>) -> ConnectionId {
        let id = ConnectionId::new();
        self.index()
            .connections
            .insert(id, ConnectionEntry::new(transport, tx));
        info!("Admitted {:?} connection {}", transport, id);
        id
    }

    pub fn activate(&self, id: ConnectionId) -> Result<(), RelayError> {
        let mut index = self.index();
        let entry = index
            .connections
            .get_mut(&id)
            .ok_or(RelayError::NotFound(id))?;
        if entry.state != ConnectionState::Connecting {
            return Err(RelayError::InvalidState {
                op: "activate",
                id,
                state: entry.state,
            });
        }
        entry.state = ConnectionState::Open;
        Ok(())
    }

    /// Moves the connection into `room`, leaving any previous room first
    /// (a connection belongs to at most one room). Returns the vacated
    /// room, if any. The target room is created on first join.
    pub fn join_room(&self, id: ConnectionId, room: RoomId) -> Result<Option<RoomId>, RelayError> {
        let mut index = self.index();
        if !index.connections.contains_key(&id) {
            return Err(RelayError::NotFound(id));
        }
        let previous = Self::detach(&mut index, id);
        index.rooms.entry(room.clone()).or_default().insert(id);
        if let Some(entry) = index.connections.get_mut(&id) {
            entry.room = Some(room);
            entry.last_activity = Instant::now();
        }
        Ok(previous)
    }

    /// Idempotent: leaving twice is a no-op, not an error.
    pub fn leave_room(&self, id: ConnectionId) -> Result<Option<RoomId>, RelayError> {
        let mut index = self.index();
        if !index.connections.contains_key(&id) {
            return Err(RelayError::NotFound(id));
        }
        Ok(Self::detach(&mut index, id))
    }

    /// Idempotent: closing an unknown or already closed connection is a
    /// no-op. Removing the entry drops the outbound sender, which ends
    /// the adapter's stream.
    pub fn close(&self, id: ConnectionId) -> Option<ClosedConnection> {
        let mut index = self.index();
        index.connections.get_mut(&id)?.state = ConnectionState::Closing;
        let room = Self::detach(&mut index, id);
        let mut entry = index.connections.remove(&id)?;
        entry.state = ConnectionState::Closed;
        info!("Closed {:?} connection {}", entry.transport, id);
        Some(ClosedConnection {
            transport: entry.transport,
            room,
        })
    }

    /// Point-in-time snapshot of a room's members. An absent room is an
    /// empty snapshot; zero-member rooms are deleted, never kept.
    pub fn members(&self, room: &RoomId) -> Vec<Member> {
        let index = self.index();
        let Some(ids) = index.rooms.get(room) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| {
                index.connections.get(id).map(|entry| Member {
                    id: *id,
                    tx: entry.tx.clone(),
                })
            })
            .collect()
    }

    pub fn is_open_member(&self, id: ConnectionId, room: &RoomId) -> bool {
        self.index().connections.get(&id).is_some_and(|entry| {
            entry.state == ConnectionState::Open && entry.room.as_ref() == Some(room)
        })
    }

    pub fn room_of(&self, id: ConnectionId) -> Option<RoomId> {
        self.index()
            .connections
            .get(&id)
            .and_then(|entry| entry.room.clone())
    }

    pub fn sender_of(&self, id: ConnectionId) -> Option<mpsc::Sender<SignalMessage>> {
        self.index()
            .connections
            .get(&id)
            .map(|entry| entry.tx.clone())
    }

    pub fn touch(&self, id: ConnectionId) {
        if let Some(entry) = self.index().connections.get_mut(&id) {
            entry.last_activity = Instant::now();
        }
    }

    pub fn touch_many(&self, ids: &[ConnectionId]) {
        let now = Instant::now();
        let mut index = self.index();
        for id in ids {
            if let Some(entry) = index.connections.get_mut(id) {
                entry.last_activity = now;
            }
        }
    }

    /// Connections with no activity for at least `max_idle`.
    pub fn idle(&self, max_idle: Duration) -> Vec<ConnectionId> {
        let now = Instant::now();
        self.index()
            .connections
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_activity) >= max_idle)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn room_counts(&self) -> Vec<(RoomId, usize)> {
        self.index()
            .rooms
            .iter()
            .map(|(room, members)| (room.clone(), members.len()))
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.index().connections.len()
    }

    /// Removes `id` from its room and deletes the room if it empties,
    /// keeping both indexes in step. Callers hold the lock.
    fn detach(index: &mut RegistryIndex, id: ConnectionId) -> Option<RoomId> {
        let room = index.connections.get_mut(&id)?.room.take()?;
        if let Some(members) = index.rooms.get_mut(&room) {
            members.remove(&id);
            if members.is_empty() {
                index.rooms.remove(&room);
            }
        }
        Some(room)
    }
}
