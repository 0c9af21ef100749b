//! Received files written to a local directory.
//!
//! The directory is created on first use. File names are taken verbatim from
//! the sender, so a name containing path separators or `..` lands outside the
//! directory; existing files with the same name are overwritten.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{
    fs::{self, File},
    io::{AsyncWriteExt, BufWriter},
};

use crate::domain::{ReceivedFile, ReceivedFileStore, StoreError};

/// Default directory for received files, relative to the working directory
pub const DEFAULT_RECEIVED_DIR: &str = "received_files";

pub struct LocalFileStore {
    dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ReceivedFileStore for LocalFileStore {
    async fn create(&self, file_name: &str) -> Result<Box<dyn ReceivedFile>, StoreError> {
        let create_err = |source| StoreError::Create {
            name: file_name.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).await.map_err(create_err)?;
        let path = self.dir.join(file_name);
        let file = File::create(&path).await.map_err(create_err)?;
        tracing::debug!("Writing received file to {}", path.display());
        Ok(Box::new(LocalReceivedFile {
            writer: BufWriter::new(file),
        }))
    }
}

struct LocalReceivedFile {
    writer: BufWriter<File>,
}

#[async_trait]
impl ReceivedFile for LocalReceivedFile {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StoreError> {
        self.writer.write_all(chunk).await?;
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<(), StoreError> {
        let mut file = self;
        file.writer.flush().await?;
        Ok(())
    }
}
