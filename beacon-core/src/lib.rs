pub mod error;
pub mod model;

pub use error::RelayError;
pub use model::{ConnectionId, ConnectionState, RoomId, SignalKind, SignalMessage, Transport};
