//! Command line client for the LAN chat relay.
//!
//! Speaks the relay's TCP protocol: `HELO` handshake, JSON messages and
//! acknowledged file transfers.

pub mod command;
pub mod connection;
pub mod error;
pub mod formatter;
pub mod incoming;
mod runner;
mod session;
mod ui;

pub use connection::{RelayConnection, RelayWriter, connect};
pub use error::ClientError;
pub use runner::run_client;
