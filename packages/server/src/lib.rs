//! LAN chat relay server library.
//!
//! Desktop clients connect over TCP and exchange JSON messages and files;
//! browsers join through a small HTTP bridge with a server-sent event stream.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

#[cfg(test)]
mod test_support;
