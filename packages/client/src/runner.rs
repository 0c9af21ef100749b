//! Client execution logic with reconnection support.

use std::time::Duration;

use crate::{error::ClientError, session::run_client_session};

pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the relay client with reconnection logic
///
/// A handshake failure is returned at once. Other failures are retried until
/// [`MAX_RECONNECT_ATTEMPTS`] have been made.
pub async fn run_client(addr: String, nickname: String) -> Result<(), ClientError> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            addr,
            nickname,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&addr, &nickname).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                // If connection ended normally (user exit), don't reconnect
                return Ok(());
            }
            Err(e @ ClientError::HandshakeFailed(_)) => {
                tracing::error!("{}", e);
                tracing::error!("{} does not speak the relay protocol. Exiting.", addr);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if reconnect_count >= MAX_RECONNECT_ATTEMPTS {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}
