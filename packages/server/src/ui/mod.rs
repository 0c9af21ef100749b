//! Outer layer: TCP relay, web bridge and server runner.

mod handler;
mod server;
mod signal;
pub mod state;
mod tcp;

pub use handler::{POLL_INTERVAL, SendForm};
pub use server::{BoundServer, Server, ServerError, router};
pub use signal::shutdown_signal;
pub use state::AppState;
pub use tcp::{accept_loop, handle_connection};
