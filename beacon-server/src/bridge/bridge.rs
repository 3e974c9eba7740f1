use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use beacon_core::{RelayError, RoomId, SignalMessage};

/// A message relayed through the shared pub/sub channel. Every subscribed
/// process receives it, including the one that published it; `origin`
/// lets the ingest loop drop its own echoes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeEnvelope {
    pub origin: Uuid,
    pub message: SignalMessage,
}

/// Cross-process relay for room traffic.
///
/// Subscriptions are reference-counted per process: one external
/// subscription per room, no matter how many local connections joined it.
#[async_trait]
pub trait Bridge: Send + Sync {
    async fn subscribe(&self, room: &RoomId) -> Result<(), RelayError>;

    async fn unsubscribe(&self, room: &RoomId) -> Result<(), RelayError>;

    async fn publish(&self, envelope: &BridgeEnvelope) -> Result<(), RelayError>;
}
