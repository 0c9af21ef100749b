//! TCP ソケットを使った SessionSink 実装
//!
//! 接続の書き込み側（`OwnedWriteHalf`）をセッションごとの Mutex で保護し、
//! 並行する送信が 1 フレームずつ書き込まれるようにします。
//! 読み込み側は接続ごとの reader タスクが所有します。

use std::io::ErrorKind;

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, net::tcp::OwnedWriteHalf, sync::Mutex};

use crate::domain::{DeliveryError, SessionSink};

pub struct TcpSessionSink {
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpSessionSink {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl SessionSink for TcpSessionSink {
    async fn send(&self, frame: &[u8]) -> Result<(), DeliveryError> {
        let mut writer = self.writer.lock().await;
        let result = async {
            writer.write_all(frame).await?;
            writer.flush().await
        }
        .await;
        result.map_err(|e| match e.kind() {
            ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected => DeliveryError::Closed,
            _ => DeliveryError::Io(e),
        })
    }
}
