//! UseCase: セッション切断処理
//!
//! 接続タスクの終了時（正常終了・エラー・パニックのいずれでも）に呼ばれる。
//! 送信失敗で既に削除されたセッションに対しては何もしない。

use std::sync::Arc;

use crate::domain::{RelayEvent, RelayObserver, Session, SessionKey, SessionRegistry};

use super::{broadcast::BroadcastEngine, error::BroadcastError};

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    registry: Arc<dyn SessionRegistry>,
    broadcast: Arc<BroadcastEngine>,
    observer: Arc<dyn RelayObserver>,
}

impl DisconnectSessionUseCase {
    /// 新しい DisconnectSessionUseCase を作成
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        broadcast: Arc<BroadcastEngine>,
        observer: Arc<dyn RelayObserver>,
    ) -> Self {
        Self {
            registry,
            broadcast,
            observer,
        }
    }

    /// セッション切断を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Session))` - 削除したセッション（残りのセッションへ名簿を配信済み）
    /// * `Ok(None)` - 既に削除されていた
    pub async fn execute(&self, key: SessionKey) -> Result<Option<Session>, BroadcastError> {
        let Some(session) = self.registry.remove(&key).await else {
            return Ok(None);
        };

        self.observer.on_event(RelayEvent::SessionDisconnected {
            key,
            nickname: session.nickname.clone(),
            last_seen_at: session.last_seen_at,
        });
        self.broadcast.broadcast_roster().await?;

        Ok(Some(session))
    }
}
