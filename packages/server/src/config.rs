//! Runtime configuration of the relay server.

use std::path::PathBuf;

use crate::infrastructure::store::DEFAULT_RECEIVED_DIR;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_TCP_PORT: u16 = 8080;
pub const DEFAULT_HTTP_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Listen address for desktop clients
    pub tcp_addr: String,
    /// Listen address for the web bridge
    pub http_addr: String,
    /// Where received files are written
    pub received_dir: PathBuf,
}

impl RelayConfig {
    pub fn new(host: &str, tcp_port: u16, http_port: u16, received_dir: impl Into<PathBuf>) -> Self {
        Self {
            tcp_addr: format!("{host}:{tcp_port}"),
            http_addr: format!("{host}:{http_port}"),
            received_dir: received_dir.into(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_HOST,
            DEFAULT_TCP_PORT,
            DEFAULT_HTTP_PORT,
            DEFAULT_RECEIVED_DIR,
        )
    }
}
