//! Shared building blocks for the LAN chat relay.
//!
//! Both the relay server and the command line client depend on this crate for
//! the wire protocol, timestamps and logging setup.

pub mod logger;
pub mod protocol;
pub mod time;
