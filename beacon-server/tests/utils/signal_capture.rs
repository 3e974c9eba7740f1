use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use beacon_core::{SignalKind, SignalMessage};

/// Timeout for waiting on a delivery (ms).
pub const RECV_TIMEOUT_MS: u64 = 2000;

/// Receiving side of one connection's outbound channel, with timeout
/// helpers for assertions.
pub struct SignalCapture {
    rx: mpsc::Receiver<SignalMessage>,
}

impl SignalCapture {
    pub fn new(rx: mpsc::Receiver<SignalMessage>) -> Self {
        Self { rx }
    }

    /// Next delivery, panicking if none arrives in time.
    pub async fn expect_next(&mut self) -> SignalMessage {
        timeout(Duration::from_millis(RECV_TIMEOUT_MS), self.rx.recv())
            .await
            .expect("timed out waiting for a signal")
            .expect("channel closed while waiting for a signal")
    }

    /// Next delivery of the given kind, skipping others.
    pub async fn expect_kind(&mut self, kind: SignalKind) -> SignalMessage {
        loop {
            let msg = self.expect_next().await;
            if msg.kind == kind {
                return msg;
            }
        }
    }

    /// Asserts nothing is delivered for a quiet window.
    pub async fn expect_silence(&mut self, window_ms: u64) {
        match timeout(Duration::from_millis(window_ms), self.rx.recv()).await {
            Err(_) => {}
            Ok(None) => {}
            Ok(Some(msg)) => panic!("expected silence, got {:?}", msg),
        }
    }

    /// Everything currently buffered, without waiting.
    pub fn drain(&mut self) -> Vec<SignalMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// True once the registry dropped the sending half, i.e. the
    /// connection was closed.
    pub async fn closed(&mut self) -> bool {
        loop {
            match timeout(Duration::from_millis(RECV_TIMEOUT_MS), self.rx.recv()).await {
                Ok(None) => return true,
                Ok(Some(_)) => continue,
                Err(_) => return false,
            }
        }
    }
}
