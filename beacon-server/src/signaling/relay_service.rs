use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use beacon_core::{ConnectionId, RelayError, RoomId, SignalMessage, Transport};

use crate::bridge::{Bridge, BridgeEnvelope};
use crate::broadcast::RoomBroadcaster;
use crate::config::RelayConfig;
use crate::registry::ConnectionRegistry;

/// Adapter-facing facade over registry, broadcaster and bridge. Both
/// transports and the HTTP surface talk to the relay through this type.
pub struct RelayService {
    origin: Uuid,
    registry: Arc<ConnectionRegistry>,
    broadcaster: RoomBroadcaster,
    bridge: Arc<dyn Bridge>,
    config: RelayConfig,
}

impl RelayService {
    /// Builds the service and spawns its background tasks: the bridge
    /// ingest loop and the stale-connection reaper.
    pub fn start(
        config: RelayConfig,
        origin: Uuid,
        bridge: Arc<dyn Bridge>,
        bridge_rx: mpsc::UnboundedReceiver<BridgeEnvelope>,
    ) -> Arc<Self> {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = RoomBroadcaster::new(registry.clone(), bridge.clone(), origin);

        let relay = Arc::new(Self {
            origin,
            registry,
            broadcaster,
            bridge,
            config,
        });
        Self::spawn_ingest(relay.clone(), bridge_rx);
        Self::spawn_reaper(relay.clone());
        relay
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// A fresh outbound channel, sized by configuration. The adapter
    /// keeps the receiver; the sender goes to `admit`.
    pub fn outbound_channel(&self) -> (mpsc::Sender<SignalMessage>, mpsc::Receiver<SignalMessage>) {
        mpsc::channel(self.config.channel_capacity)
    }

    /// Admits a connection in Connecting state. With `initial_room` it is
    /// also activated and joined in the same call (the SSE path; sockets
    /// join through an explicit event).
    pub async fn admit(
        &self,
        transport: Transport,
        tx: mpsc::Sender<SignalMessage>,
        initial_room: Option<RoomId>,
    ) -> Result<ConnectionId, RelayError> {
        let id = self.registry.admit(transport, tx);
        if let Some(room) = initial_room {
            let opened = match self.registry.activate(id) {
                Ok(()) => self.join(id, room).await,
                Err(e) => Err(e),
            };
            if let Err(e) = opened {
                self.registry.close(id);
                return Err(e);
            }
        }
        Ok(id)
    }

    pub fn activate(&self, id: ConnectionId) -> Result<(), RelayError> {
        self.registry.activate(id)
    }

    /// Moves a connection into `room`. The vacated room (if any) gets a
    /// `leave` broadcast and drops one bridge subscription; the new room
    /// gains a subscription and a `join` broadcast to the members already
    /// there.
    pub async fn join(&self, id: ConnectionId, room: RoomId) -> Result<(), RelayError> {
        let previous = self.registry.join_room(id, room.clone())?;
        if let Some(previous) = previous {
            self.depart(id, previous).await;
        }

        if let Err(e) = self.bridge.subscribe(&room).await {
            warn!("Bridge subscribe for room {} failed: {}", room, e);
        }
        info!("Connection {} joined room {}", id, room);

        let join = SignalMessage::join(room, id);
        if let Err(e) = self.broadcaster.publish(&join).await {
            warn!("Join broadcast degraded: {}", e);
        }
        Ok(())
    }

    /// Explicit leave requested by the client. Idempotent.
    pub async fn leave(&self, id: ConnectionId) -> Result<(), RelayError> {
        if let Some(room) = self.registry.leave_room(id)? {
            self.depart(id, room).await;
        }
        Ok(())
    }

    /// Verifies the sender is an open member of the target room, then
    /// fans out. Without the check any client could forge messages as
    /// another peer.
    pub async fn publish(&self, msg: SignalMessage) -> Result<(), RelayError> {
        if !self.registry.is_open_member(msg.sender_id, &msg.room_id) {
            return Err(RelayError::Forbidden(msg.sender_id, msg.room_id));
        }
        self.registry.touch(msg.sender_id);
        self.broadcaster.publish(&msg).await
    }

    /// Tears the connection down and notifies its room. Idempotent; safe
    /// to call from the adapter and the reaper concurrently.
    pub async fn disconnect(&self, id: ConnectionId) {
        let Some(closed) = self.registry.close(id) else {
            return;
        };
        if let Some(room) = closed.room {
            self.depart(id, room).await;
        }
    }

    /// Error signal delivered to one connection only, outside any room
    /// fan-out.
    pub fn send_error(&self, id: ConnectionId, reason: &str) {
        let Some(tx) = self.registry.sender_of(id) else {
            return;
        };
        let room = self
            .registry
            .room_of(id)
            .unwrap_or_else(|| RoomId::from(""));
        if tx.try_send(SignalMessage::error(room, id, reason)).is_err() {
            warn!("Dropped error signal for {}", id);
        }
    }

    pub fn touch(&self, id: ConnectionId) {
        self.registry.touch(id);
    }

    pub fn room_of(&self, id: ConnectionId) -> Option<RoomId> {
        self.registry.room_of(id)
    }

    pub fn room_counts(&self) -> Vec<(RoomId, usize)> {
        self.registry.room_counts()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    /// Leave side effects for a room the connection no longer occupies:
    /// one `leave` to every remaining member, local and remote, and one
    /// subscription release.
    async fn depart(&self, id: ConnectionId, room: RoomId) {
        if let Err(e) = self.bridge.unsubscribe(&room).await {
            warn!("Bridge unsubscribe for room {} failed: {}", room, e);
        }
        let leave = SignalMessage::leave(room, id);
        if let Err(e) = self.broadcaster.publish(&leave).await {
            warn!("Leave broadcast degraded: {}", e);
        }
    }

    fn spawn_ingest(relay: Arc<Self>, mut rx: mpsc::UnboundedReceiver<BridgeEnvelope>) {
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                // Own publications come back from the shared channel too.
                if envelope.origin == relay.origin {
                    continue;
                }
                relay.broadcaster.deliver_local(&envelope.message);
            }
            info!("Bridge ingest channel closed");
        });
    }

    fn spawn_reaper(relay: Arc<Self>) {
        let interval = relay.config.heartbeat_interval;
        let max_idle = relay.config.idle_timeout;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            loop {
                tick.tick().await;
                for id in relay.registry.idle(max_idle) {
                    warn!("Evicting idle connection {}", id);
                    relay.disconnect(id).await;
                }
            }
        });
    }
}
