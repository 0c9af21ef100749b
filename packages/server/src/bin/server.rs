//! LAN chat relay server.
//!
//! Relays chat messages and files between desktop clients and serves a web
//! page that joins the same conversation.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin lanrelay-server
//! cargo run --bin lanrelay-server -- --host 127.0.0.1 --tcp-port 9000 --http-port 9001
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use lanrelay_server::{
    config::{DEFAULT_HOST, DEFAULT_HTTP_PORT, DEFAULT_TCP_PORT, RelayConfig},
    infrastructure::{
        observer::LogObserver, outbox::InMemoryWebOutbox, registry::InMemorySessionRegistry,
        store::{DEFAULT_RECEIVED_DIR, LocalFileStore},
    },
    ui::{AppState, Server},
};
use lanrelay_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "lanrelay-server")]
#[command(about = "LAN chat relay for desktop clients and browsers", long_about = None)]
struct Args {
    /// Host address to bind both listeners to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port for desktop clients
    #[arg(short = 't', long, default_value_t = DEFAULT_TCP_PORT)]
    tcp_port: u16,

    /// Port for the web bridge
    #[arg(short = 'w', long, default_value_t = DEFAULT_HTTP_PORT)]
    http_port: u16,

    /// Directory received files are written to
    #[arg(short = 'd', long, default_value = DEFAULT_RECEIVED_DIR)]
    received_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = RelayConfig::new(&args.host, args.tcp_port, args.http_port, args.received_dir);

    // Initialize dependencies in order:
    // 1. Registry
    // 2. Web outbox, file store and observer
    // 3. UseCases (AppState)
    // 4. Server

    // 1. Create Registry (in-memory)
    let registry = Arc::new(InMemorySessionRegistry::new());

    // 2. Create the rest of the infrastructure
    let web_outbox = Arc::new(InMemoryWebOutbox::new());
    let store = Arc::new(LocalFileStore::new(&config.received_dir));
    tracing::info!("Received files go to {}", store.dir().display());
    let observer = Arc::new(LogObserver);

    // 3. Create UseCases
    let state = Arc::new(AppState::new(registry, web_outbox, store, observer));

    // 4. Bind and run the server
    let server = Server::new(state);
    let bound = match server.bind(&config.tcp_addr, &config.http_addr).await {
        Ok(bound) => bound,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = bound.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
