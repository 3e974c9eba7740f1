mod bridge;
mod local_bridge;
mod redis_bridge;
mod subscriptions;

pub use bridge::*;
pub use local_bridge::*;
pub use redis_bridge::*;
