//! TCP side of the relay: accept loop and per-connection tasks.

mod acceptor;
mod connection;

pub use acceptor::accept_loop;
pub use connection::handle_connection;
