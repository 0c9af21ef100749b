//! Accept loop for desktop clients.

use std::{sync::Arc, time::Duration};

use tokio::net::TcpListener;

use crate::ui::state::AppState;

use super::connection::handle_connection;

/// Pause after a failed accept (e.g. file descriptor exhaustion)
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Accept connections forever, one task per connection.
pub async fn accept_loop(listener: TcpListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::debug!("Accepted connection from {}", peer);
                tokio::spawn(handle_connection(stream, peer, state.clone()));
            }
            Err(e) => {
                tracing::error!("Failed to accept connection: {}", e);
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}
