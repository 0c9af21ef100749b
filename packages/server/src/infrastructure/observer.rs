//! RelayObserver that writes events to the log.

use lanrelay_shared::time::millis_to_wire_timestamp;

use crate::domain::{RelayEvent, RelayObserver};

/// Console observer used by the server binary
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RelayObserver for LogObserver {
    fn on_event(&self, event: RelayEvent) {
        match event {
            RelayEvent::SessionConnected { key } => {
                tracing::info!("Client '{}' connected", key);
            }
            RelayEvent::SessionDisconnected {
                key,
                nickname,
                last_seen_at,
            } => {
                tracing::info!(
                    "Client '{}' ({}) disconnected, last active at {}",
                    key,
                    nickname,
                    millis_to_wire_timestamp(last_seen_at)
                );
            }
            RelayEvent::SessionEvicted { key } => {
                tracing::warn!("Client '{}' evicted after a failed send", key);
            }
            RelayEvent::NicknameChanged { key, nickname } => {
                tracing::info!("Client '{}' is now known as '{}'", key, nickname);
            }
            RelayEvent::ChatRelayed {
                nickname,
                content,
                delivered,
            } => {
                let preview: String = content.chars().take(20).collect();
                tracing::info!(
                    "Relayed message from '{}' to {} client(s): {}",
                    nickname,
                    delivered,
                    preview
                );
            }
            RelayEvent::FileReceived {
                key,
                file_name,
                received,
                complete,
            } => {
                if complete {
                    tracing::info!(
                        "Received file '{}' ({} bytes) from '{}'",
                        file_name,
                        received,
                        key
                    );
                } else {
                    tracing::warn!(
                        "File '{}' from '{}' is truncated at {} bytes",
                        file_name,
                        key,
                        received
                    );
                }
            }
        }
    }
}
