//! Command line client for the LAN chat relay.
//!
//! Connects to the relay's TCP port, announces a nickname and relays chat
//! lines typed at the `nickname>` prompt.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin lanrelay-client -- --nickname Alice
//! cargo run --bin lanrelay-client -- -s 192.168.1.10:8080 -n Bob
//! ```

use clap::Parser;

use lanrelay_shared::{logger::setup_logger, protocol::PLACEHOLDER_NICKNAME};

#[derive(Parser, Debug)]
#[command(name = "lanrelay-client")]
#[command(about = "Command line client for the LAN chat relay", long_about = None)]
struct Args {
    /// Relay server address (host:port of the TCP listener)
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Nickname shown to other participants
    #[arg(short = 'n', long, default_value = PLACEHOLDER_NICKNAME)]
    nickname: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = lanrelay_client::run_client(args.server, args.nickname).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
