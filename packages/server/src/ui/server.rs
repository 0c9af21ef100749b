//! Server execution logic.

use std::{future::Future, io, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{index, send, stream},
    signal::shutdown_signal,
    state::AppState,
    tcp::accept_loop,
};

/// Startup and runtime errors of the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {listener} listener on {addr}: {source}")]
    Bind {
        listener: &'static str,
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),
}

/// LAN chat relay server
///
/// Serves desktop clients over TCP and browsers over HTTP from the same state.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(Arc::new(app_state));
/// let bound = server.bind("0.0.0.0:8080", "0.0.0.0:8000").await?;
/// bound.run().await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Bind both listeners
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if either address cannot be bound.
    pub async fn bind(self, tcp_addr: &str, http_addr: &str) -> Result<BoundServer, ServerError> {
        let tcp_listener = bind_listener("TCP", tcp_addr).await?;
        let http_listener = bind_listener("HTTP", http_addr).await?;
        Ok(BoundServer {
            state: self.state,
            tcp_listener,
            http_listener,
        })
    }
}

async fn bind_listener(listener: &'static str, addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            listener,
            addr: addr.to_string(),
            source,
        })
}

/// HTTP routes of the web bridge
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/stream", get(stream))
        .route("/send", post(send))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Server with both listeners bound, ready to run
pub struct BoundServer {
    state: Arc<AppState>,
    tcp_listener: TcpListener,
    http_listener: TcpListener,
}

impl BoundServer {
    /// Address desktop clients connect to
    pub fn tcp_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.tcp_listener.local_addr()?)
    }

    /// Address of the web bridge
    pub fn http_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.http_listener.local_addr()?)
    }

    /// Run until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Run the TCP accept loop and the HTTP server until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tcp_addr = self.tcp_addr()?;
        let http_addr = self.http_addr()?;

        tracing::info!("Chat relay listening on {}", tcp_addr);
        tracing::info!("Web bridge listening on http://{}", http_addr);
        tracing::info!("Press Ctrl+C to shutdown");

        let app = router(self.state.clone());
        let http = axum::serve(self.http_listener, app).into_future();
        let tcp = accept_loop(self.tcp_listener, self.state);

        tokio::select! {
            result = http => result?,
            _ = tcp => {},
            _ = shutdown => {},
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
