//! Received-file storage interfaces.

use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create received file '{name}': {source}")]
    Create {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write received file: {0}")]
    Write(#[from] std::io::Error),
}

/// Where received files are written
#[async_trait]
pub trait ReceivedFileStore: Send + Sync {
    /// Create (or truncate) the file named `file_name`.
    ///
    /// The name is used verbatim.
    async fn create(&self, file_name: &str) -> Result<Box<dyn ReceivedFile>, StoreError>;
}

/// A file being written
#[async_trait]
pub trait ReceivedFile: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StoreError>;

    /// Flush whatever has been written so far
    async fn finish(self: Box<Self>) -> Result<(), StoreError>;
}

/// Raw payload bytes following file metadata on a connection
#[async_trait]
pub trait PayloadSource: Send {
    /// Next chunk of at most `limit` bytes, or `None` once the peer has closed
    async fn read_payload_chunk(&mut self, limit: usize) -> std::io::Result<Option<Vec<u8>>>;
}
