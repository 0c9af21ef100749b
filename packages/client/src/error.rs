//! Error types for the relay client.

use std::{path::PathBuf, time::Duration};

use lanrelay_shared::protocol::ProtocolError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server did not answer `HELO` with `ACK`
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    /// Connecting (including the handshake) took too long
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The server closed the connection
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// A local file to send could not be read
    #[error("Cannot read '{}': {source}", path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The server did not acknowledge a file header
    #[error("Server did not acknowledge file '{0}'")]
    FileNotAcknowledged(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
