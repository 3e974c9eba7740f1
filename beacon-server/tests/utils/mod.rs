pub mod signal_capture;

pub use signal_capture::*;
