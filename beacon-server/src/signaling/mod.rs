mod client_event;
mod relay_service;
mod sse_handler;
mod status;
mod ws_handler;

pub use client_event::*;
pub use relay_service::*;
pub use sse_handler::*;
pub use status::*;
pub use ws_handler::*;
