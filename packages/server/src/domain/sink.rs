//! SessionSink trait 定義
//!
//! セッションへのフレーム送信のインターフェース。
//! 具体的な実装（TCP ソケット、チャンネル）は Infrastructure 層が提供します。

use async_trait::async_trait;
use thiserror::Error;

/// Delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The peer is gone (reset, broken pipe, receiver dropped)
    #[error("connection closed")]
    Closed,

    /// Write failed for another reason
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// 1 セッションへの送信口
///
/// 実装は 1 フレームの書き込みを排他的に行うこと（並行する broadcast が
/// 同じ接続に書き込んでもフレームが混ざらない）。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionSink: Send + Sync {
    /// 1 フレームを送信
    async fn send(&self, frame: &[u8]) -> Result<(), DeliveryError>;
}
