//! UseCase: セッション接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 登録直後に全セッション（新規セッション自身を含む）へ名簿が届くことを保証
//! - 新規セッションが仮のニックネームで名簿に載ることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の接続、2 つ目の接続

use std::sync::Arc;

use crate::domain::{RelayEvent, RelayObserver, Session, SessionKey, SessionRegistry, SessionSink};

use super::{broadcast::BroadcastEngine, error::BroadcastError};

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    /// SessionRegistry（接続中セッションの管理）
    registry: Arc<dyn SessionRegistry>,
    /// BroadcastEngine（名簿の配信）
    broadcast: Arc<BroadcastEngine>,
    /// RelayObserver（イベント通知）
    observer: Arc<dyn RelayObserver>,
}

impl ConnectSessionUseCase {
    /// 新しい ConnectSessionUseCase を作成
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

    /// セッション接続を実行
    ///
    /// # Arguments
    ///
    /// * `key` - 接続元のソケットアドレス
    /// * `sink` - このセッションへの送信ハンドル
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - 登録されたセッション
    /// * `Err(BroadcastError)` - 名簿を作れなかった（登録自体は完了している）
    pub async fn execute(
        &self,
        key: SessionKey,
        sink: Arc<dyn SessionSink>,
    ) -> Result<Session, BroadcastError> {
        // 1. Registry に登録
        let session = self.registry.register(key, sink).await;
        self.observer
            .on_event(RelayEvent::SessionConnected { key });

        // 2. 名簿を全セッションへ配信
        self.broadcast.broadcast_roster().await?;

        Ok(session)
    }
}
