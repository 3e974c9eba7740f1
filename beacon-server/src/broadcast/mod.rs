mod room_broadcaster;

pub use room_broadcaster::*;
