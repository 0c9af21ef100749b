//! Inbound events reported to the host application (console, GUI).

use super::SessionKey;

#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    SessionConnected {
        key: SessionKey,
    },
    SessionDisconnected {
        key: SessionKey,
        nickname: String,
        /// Unix milliseconds of the last valid frame
        last_seen_at: i64,
    },
    /// Removed after a failed send
    SessionEvicted {
        key: SessionKey,
    },
    NicknameChanged {
        key: SessionKey,
        nickname: String,
    },
    ChatRelayed {
        nickname: String,
        content: String,
        delivered: usize,
    },
    FileReceived {
        key: SessionKey,
        file_name: String,
        received: u64,
        complete: bool,
    },
}

/// Callback the relay core uses to report what happened
pub trait RelayObserver: Send + Sync {
    fn on_event(&self, event: RelayEvent);
}
