//! UseCase: ファイル受信
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ReceiveFileUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - ヘッダを受け取ったら送信者に ACK が返ること
//! - ちょうど `file_size` バイトだけ読み、それ以降のバイトは次のフレームとして残ること
//! - 受信完了時に送信者以外へ system 通知が届くこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：完全な受信
//! - 異常系：途中で切断（切り詰められたファイルが残り、通知は無し）
//! - 異常系：保存先が作れない（ペイロードは読み捨てられる）
//! - 異常系：セッションが名簿から外れている（接続の送信口に ACK を返し、受信は続ける）
//! - 異常系：ACK を返せない（ペイロードを読み捨ててからエラーを返す）

use std::sync::Arc;

use lanrelay_shared::{
    protocol::{ACK, FileMeta, Message, SystemNotification},
    time::Clock,
};

use crate::domain::{
    PayloadSource, ReceivedFile, ReceivedFileStore, RelayEvent, RelayObserver, SessionKey,
    SessionSink,
};

use super::{broadcast::BroadcastEngine, error::FileIntakeError};

/// 1 回の read で要求するペイロードの最大バイト数
pub const PAYLOAD_CHUNK_LIMIT: usize = 64 * 1024;

/// 1 回のファイル受信の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReceipt {
    pub file_name: String,
    /// ヘッダで宣言されたサイズ
    pub expected: u64,
    /// 実際に受け取ったバイト数
    pub received: u64,
    pub complete: bool,
    /// 保存先への書き込みが全て成功したか
    pub stored: bool,
}

/// ファイル受信のユースケース
pub struct ReceiveFileUseCase {
    /// ReceivedFileStore（保存先）
    store: Arc<dyn ReceivedFileStore>,
    /// BroadcastEngine（完了通知）
    broadcast: Arc<BroadcastEngine>,
    observer: Arc<dyn RelayObserver>,
    clock: Arc<dyn Clock>,
}

impl ReceiveFileUseCase {
    /// 新しい ReceiveFileUseCase を作成
    pub fn new(
        store: Arc<dyn ReceivedFileStore>,
        broadcast: Arc<BroadcastEngine>,
        observer: Arc<dyn RelayObserver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            broadcast,
            observer,
            clock,
        }
    }

    /// ファイル受信を実行
    ///
    /// # Arguments
    ///
    /// * `key` - 送信元のセッション
    /// * `reply` - 送信元の接続の送信口（名簿から外れていても ACK はここに返す）
    /// * `meta` - ファイルのメタデータ
    /// * `payload` - ペイロードの先頭に位置しているソース
    ///
    /// # Returns
    ///
    /// * `Ok(FileReceipt)` - 受信結果（途中切断も含む）
    /// * `Err(FileIntakeError)` - ACK を返せなかった、または通知を作れなかった
    ///
    /// どの場合も `payload` は宣言されたサイズ分だけ進んでいる。
    pub async fn execute(
        &self,
        key: SessionKey,
        reply: &dyn SessionSink,
        meta: FileMeta,
        payload: &mut dyn PayloadSource,
    ) -> Result<FileReceipt, FileIntakeError> {
        // 1. 送信者に ACK を返す
        if let Err(e) = reply.send(ACK).await {
            let drained = self.copy_payload(&meta, payload, &mut None, &mut false).await;
            tracing::warn!(
                "Discarded {} payload bytes of '{}' from '{}'",
                drained,
                meta.file_name,
                key
            );
            return Err(FileIntakeError::Ack(e));
        }

        tracing::info!(
            "Receiving '{}' ({} bytes) from '{}'",
            meta.file_name,
            meta.file_size,
            key
        );

        // 2. 保存先を作る（失敗してもペイロードは読み捨てる）
        let mut file = match self.store.create(&meta.file_name).await {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        };
        let mut stored = file.is_some();

        // 3. ちょうど file_size バイトを読む
        let received = self.copy_payload(&meta, payload, &mut file, &mut stored).await;

        // 4. 書き込みを確定
        if let Some(file) = file {
            if let Err(e) = file.finish().await {
                tracing::error!("Failed to finish '{}': {}", meta.file_name, e);
                stored = false;
            }
        }

        let complete = received == meta.file_size;
        if complete && stored {
            let notice = Message::System(SystemNotification {
                content: format!(
                    "文件 {} ({} 字节) 已由 {} 发送",
                    meta.file_name,
                    meta.file_size,
                    meta.sender_label()
                ),
                timestamp: self.clock.now_wire(),
            });
            self.broadcast.broadcast(&notice, Some(&key)).await?;
        }

        self.observer.on_event(RelayEvent::FileReceived {
            key,
            file_name: meta.file_name.clone(),
            received,
            complete,
        });

        Ok(FileReceipt {
            file_name: meta.file_name,
            expected: meta.file_size,
            received,
            complete,
            stored,
        })
    }

    async fn copy_payload(
        &self,
        meta: &FileMeta,
        payload: &mut dyn PayloadSource,
        file: &mut Option<Box<dyn ReceivedFile>>,
        stored: &mut bool,
    ) -> u64 {
        let mut received: u64 = 0;
        while received < meta.file_size {
            let remaining = meta.file_size - received;
            let limit = usize::try_from(remaining)
                .unwrap_or(usize::MAX)
                .min(PAYLOAD_CHUNK_LIMIT);

            let chunk = match payload.read_payload_chunk(limit).await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Payload of '{}' interrupted: {}", meta.file_name, e);
                    break;
                }
            };
            received += chunk.len() as u64;

            let written = match file.as_mut() {
                Some(writer) => writer.write_chunk(&chunk).await,
                None => Ok(()),
            };
            if let Err(e) = written {
                tracing::error!("Failed to write '{}': {}", meta.file_name, e);
                *file = None;
                *stored = false;
            }
        }
        received
    }
}
