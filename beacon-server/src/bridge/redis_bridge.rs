use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, PubSubSink};
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};

use beacon_core::{RelayError, RoomId};

use super::bridge::{Bridge, BridgeEnvelope};
use super::subscriptions::SubscriptionTable;

/// Bridge over a shared Redis instance, one pub/sub channel per room.
/// When Redis is unreachable the error surfaces as `BridgeUnavailable`
/// and the relay degrades to single-process correctness; local members
/// always receive their messages.
pub struct RedisBridge {
    publisher: ConnectionManager,
    sink: Mutex<PubSubSink>,
    subscriptions: SubscriptionTable,
}

impl RedisBridge {
    /// Connects and spawns the task forwarding incoming pub/sub messages
    /// into the returned ingest channel.
    pub async fn connect(
        url: &str,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<BridgeEnvelope>)> {
        let client = redis::Client::open(url)?;
        let publisher = client.get_connection_manager().await?;
        let (sink, mut stream) = client.get_async_pubsub().await?.split();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("Unreadable pub/sub payload: {}", e);
                        continue;
                    }
                };
                match serde_json::from_str::<BridgeEnvelope>(&payload) {
                    Ok(envelope) => {
                        if tx.send(envelope).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid bridge envelope: {}", e),
                }
            }
            info!("Redis pub/sub stream ended");
        });

        let bridge = Self {
            publisher,
            sink: Mutex::new(sink),
            subscriptions: SubscriptionTable::default(),
        };
        Ok((bridge, rx))
    }

    fn channel(room: &RoomId) -> String {
        format!("beacon:room:{}", room)
    }

    fn unavailable(e: redis::RedisError) -> RelayError {
        RelayError::BridgeUnavailable(e.to_string())
    }
}

#[async_trait]
impl Bridge for RedisBridge {
    async fn subscribe(&self, room: &RoomId) -> Result<(), RelayError> {
        if self.subscriptions.acquire(room) {
            let subscribed = self.sink.lock().await.subscribe(Self::channel(room)).await;
            if let Err(e) = subscribed {
                self.subscriptions.release(room);
                return Err(Self::unavailable(e));
            }
        }
        Ok(())
    }

    async fn unsubscribe(&self, room: &RoomId) -> Result<(), RelayError> {
        if self.subscriptions.release(room) {
            self.sink
                .lock()
                .await
                .unsubscribe(Self::channel(room))
                .await
                .map_err(Self::unavailable)?;
        }
        Ok(())
    }

    async fn publish(&self, envelope: &BridgeEnvelope) -> Result<(), RelayError> {
        let payload = serde_json::to_string(envelope)
            .map_err(|e| RelayError::BridgeUnavailable(e.to_string()))?;
        let mut publisher = self.publisher.clone();
        publisher
            .publish::<_, _, ()>(Self::channel(&envelope.message.room_id), payload)
            .await
            .map_err(Self::unavailable)
    }
}
