//! テスト用のヘルパー（プロセス内リーダー、メモリ上のファイルストア、イベント記録）

use std::{
    collections::{HashMap, VecDeque},
    io,
    net::SocketAddr,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, ReadBuf},
    sync::mpsc,
};

use crate::domain::{
    DeliveryError, ReceivedFile, ReceivedFileStore, RelayEvent, RelayObserver, SessionKey,
    SessionRegistry, SessionSink, StoreError,
};

/// 決められたチャンク列をその順番で 1 回ずつ返すリーダー
pub struct ScriptedReader {
    chunks: VecDeque<Vec<u8>>,
}

impl ScriptedReader {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

impl AsyncRead for ScriptedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(mut chunk) = self.chunks.pop_front() {
            let n = chunk.len().min(buf.remaining());
            buf.put_slice(&chunk[..n]);
            if n < chunk.len() {
                let rest = chunk.split_off(n);
                self.chunks.push_front(rest);
            }
        }
        Poll::Ready(Ok(()))
    }
}

/// チャンネルに書き込む SessionSink
///
/// 受信側が破棄された後の送信は [`DeliveryError::Closed`] になる。
pub struct ChannelSessionSink {
    sender: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChannelSessionSink {
    /// Create a sink and the receiver that observes its frames
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl SessionSink for ChannelSessionSink {
    async fn send(&self, frame: &[u8]) -> Result<(), DeliveryError> {
        self.sender
            .send(frame.to_vec())
            .map_err(|_| DeliveryError::Closed)
    }
}

pub fn key(port: u16) -> SessionKey {
    SessionKey::new(SocketAddr::from(([10, 0, 0, 2], port)))
}

/// チャンネル付きのセッションを登録し、受信側を返す
pub async fn register_channel_session(
    registry: &Arc<dyn SessionRegistry>,
    key: SessionKey,
) -> mpsc::UnboundedReceiver<Vec<u8>> {
    let (_sink, rx) = connect_channel_session(registry, key).await;
    rx
}

/// 接続タスクと同じく、登録した送信口も手元に残す
pub async fn connect_channel_session(
    registry: &Arc<dyn SessionRegistry>,
    key: SessionKey,
) -> (Arc<dyn SessionSink>, mpsc::UnboundedReceiver<Vec<u8>>) {
    let (sink, rx) = ChannelSessionSink::new();
    let sink: Arc<dyn SessionSink> = Arc::new(sink);
    registry.register(key, sink.clone()).await;
    (sink, rx)
}

/// 受信済みフレームを全て取り出す
pub fn drain_frames(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

/// 受け取ったイベントを記録する Observer
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RelayEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<RelayEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl RelayObserver for RecordingObserver {
    fn on_event(&self, event: RelayEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// メモリ上に書き込むファイルストア
#[derive(Default)]
pub struct MemoryFileStore {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_create: bool,
}

impl MemoryFileStore {
    /// `create` が常に失敗するストア
    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().ok()?.get(name).cloned()
    }
}

#[async_trait]
impl ReceivedFileStore for MemoryFileStore {
    async fn create(&self, file_name: &str) -> Result<Box<dyn ReceivedFile>, StoreError> {
        if self.fail_create {
            return Err(StoreError::Create {
                name: file_name.to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        if let Ok(mut files) = self.files.lock() {
            files.insert(file_name.to_string(), Vec::new());
        }
        Ok(Box::new(MemoryFile {
            name: file_name.to_string(),
            files: self.files.clone(),
        }))
    }
}

struct MemoryFile {
    name: String,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

#[async_trait]
impl ReceivedFile for MemoryFile {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StoreError> {
        if let Ok(mut files) = self.files.lock() {
            files.entry(self.name.clone()).or_default().extend_from_slice(chunk);
        }
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_send_success() {
        // テスト項目: 送信したフレームを受信側で受け取れる
        let (sink, mut rx) = ChannelSessionSink::new();

        let result = sink.send(b"Hello").await;

        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some(b"Hello".to_vec()));
    }

    #[tokio::test]
    async fn test_channel_sink_send_after_receiver_dropped() {
        // テスト項目: 受信側が破棄された後の送信は Closed エラーになる
        let (sink, rx) = ChannelSessionSink::new();
        drop(rx);

        let result = sink.send(b"Hello").await;

        assert!(matches!(result, Err(DeliveryError::Closed)));
    }
}
