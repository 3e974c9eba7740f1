mod connection;
mod room;
mod signaling;

pub use connection::{ConnectionId, ConnectionState, Transport};
pub use room::RoomId;
pub use signaling::{SignalKind, SignalMessage};
