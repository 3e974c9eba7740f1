use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use beacon_core::{RelayError, RoomId};

use super::bridge::{Bridge, BridgeEnvelope};
use super::subscriptions::SubscriptionTable;

struct BusPeer {
    origin: Uuid,
    subscribed: HashSet<RoomId>,
    tx: mpsc::UnboundedSender<BridgeEnvelope>,
}

/// In-process stand-in for the shared pub/sub store, with the store's
/// semantics: a publication reaches every subscribed attachment, the
/// publisher's own included. Serves single-process deployments (no Redis
/// URL configured) and the cross-process tests, which attach several
/// relays to one bus.
#[derive(Clone, Default)]
pub struct LocalBus {
    peers: Arc<Mutex<Vec<BusPeer>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches one relay process, returning its bridge and the ingest
    /// side of the channel.
    pub fn attach(&self, origin: Uuid) -> (LocalBridge, mpsc::UnboundedReceiver<BridgeEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(BusPeer {
            origin,
            subscribed: HashSet::new(),
            tx,
        });
        let bridge = LocalBridge {
            origin,
            bus: self.clone(),
            subscriptions: SubscriptionTable::default(),
        };
        (bridge, rx)
    }

    /// Attachments currently subscribed to a room.
    pub fn subscriber_count(&self, room: &RoomId) -> usize {
        self.lock()
            .iter()
            .filter(|peer| peer.subscribed.contains(room))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BusPeer>> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_subscribed(&self, origin: Uuid, room: &RoomId, on: bool) {
        for peer in self.lock().iter_mut() {
            if peer.origin == origin {
                if on {
                    peer.subscribed.insert(room.clone());
                } else {
                    peer.subscribed.remove(room);
                }
            }
        }
    }

    fn broadcast(&self, envelope: &BridgeEnvelope) {
        // Attachments whose ingest side is gone fall off the bus.
        self.lock().retain(|peer| {
            if !peer.subscribed.contains(&envelope.message.room_id) {
                return true;
            }
            peer.tx.send(envelope.clone()).is_ok()
        });
    }
}

pub struct LocalBridge {
    origin: Uuid,
    bus: LocalBus,
    subscriptions: SubscriptionTable,
}

#[async_trait]
impl Bridge for LocalBridge {
    async fn subscribe(&self, room: &RoomId) -> Result<(), RelayError> {
        if self.subscriptions.acquire(room) {
            self.bus.set_subscribed(self.origin, room, true);
        }
        Ok(())
    }

    async fn unsubscribe(&self, room: &RoomId) -> Result<(), RelayError> {
        if self.subscriptions.release(room) {
            self.bus.set_subscribed(self.origin, room, false);
        }
        Ok(())
    }

    async fn publish(&self, envelope: &BridgeEnvelope) -> Result<(), RelayError> {
        self.bus.broadcast(envelope);
        Ok(())
    }
}
