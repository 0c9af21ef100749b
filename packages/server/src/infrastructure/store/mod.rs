//! Received-file storage implementations.

pub mod local;

pub use local::{DEFAULT_RECEIVED_DIR, LocalFileStore};
