pub mod app;
pub mod bridge;
pub mod broadcast;
pub mod config;
pub mod registry;
pub mod signaling;

pub use app::{ApiError, AppState, router};
pub use bridge::{Bridge, BridgeEnvelope, LocalBridge, LocalBus, RedisBridge};
pub use broadcast::RoomBroadcaster;
pub use config::RelayConfig;
pub use registry::{ClosedConnection, ConnectionRegistry, Member};
pub use signaling::RelayService;
