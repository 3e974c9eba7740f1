use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;
use uuid::Uuid;

use beacon_core::{RelayError, SignalMessage};

use crate::bridge::{Bridge, BridgeEnvelope};
use crate::registry::ConnectionRegistry;

/// Fans a signaling message out to every member of its room except the
/// sender. Delivery order across members is unspecified; per-recipient
/// order follows the sender's emission order.
pub struct RoomBroadcaster {
    registry: Arc<ConnectionRegistry>,
    bridge: Arc<dyn Bridge>,
    origin: Uuid,
}

impl RoomBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, bridge: Arc<dyn Bridge>, origin: Uuid) -> Self {
        Self {
            registry,
            bridge,
            origin,
        }
    }

    /// Delivers to local members, then relays through the bridge so
    /// members on other processes see the message too. Local delivery
    /// always completes; a bridge failure is surfaced after the fact.
    pub async fn publish(&self, msg: &SignalMessage) -> Result<(), RelayError> {
        self.deliver_local(msg);
        self.bridge
            .publish(&BridgeEnvelope {
                origin: self.origin,
                message: msg.clone(),
            })
            .await
    }

    /// Local fan-out only. The bridge ingest loop re-enters here for
    /// messages published by other processes.
    pub fn deliver_local(&self, msg: &SignalMessage) {
        let members = self.registry.members(&msg.room_id);
        let mut delivered = Vec::with_capacity(members.len());

        for member in members {
            if member.id == msg.sender_id {
                continue;
            }
            // A saturated or closed recipient loses this one delivery;
            // the rest of the room is unaffected.
            match member.tx.try_send(msg.clone()) {
                Ok(()) => delivered.push(member.id),
                Err(TrySendError::Full(_)) => {
                    warn!("Channel for {} saturated, dropping {:?}", member.id, msg.kind);
                }
                Err(TrySendError::Closed(_)) => {
                    warn!("Channel for {} closed, dropping {:?}", member.id, msg.kind);
                }
            }
        }

        self.registry.touch_many(&delivered);
    }
}
