//! Broadcast Engine: レジストリのスナップショットに対するファンアウト
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastEngine::broadcast() / broadcast_roster() / unicast()
//!
//! ### なぜこのテストが必要か
//! - 除外指定なしなら N 件、除外指定ありなら N-1 件届くこと（完全性）
//! - 1 つのセッションの送信失敗が他のセッションへの配信を妨げないこと（障害の隔離）
//! - 送信に失敗したセッションが即座に削除され、名簿が再配信されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：全セッションへの配信、送信者の除外
//! - 異常系：送信失敗するセッションが混ざっている
//! - エッジケース：名簿の再配信中にさらに送信失敗が起きる

use std::sync::Arc;

use futures_util::future::join_all;
use lanrelay_shared::protocol::{Message, UserListBroadcast};

use crate::domain::{
    DeliveryError, RelayEvent, RelayObserver, Session, SessionKey, SessionRegistry,
    build_user_list,
};

use super::error::BroadcastError;

/// 1 回のファンアウトの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// 送信に成功したセッション数
    pub delivered: usize,
    /// 送信に失敗して削除されたセッション
    pub evicted: Vec<SessionKey>,
}

/// フレームを複数のセッションへ並行に送るエンジン
pub struct BroadcastEngine {
    /// SessionRegistry（接続中セッションの唯一の情報源）
    registry: Arc<dyn SessionRegistry>,
    /// RelayObserver（削除の通知先）
    observer: Arc<dyn RelayObserver>,
}

impl BroadcastEngine {
    /// 新しい BroadcastEngine を作成
    pub fn new(registry: Arc<dyn SessionRegistry>, observer: Arc<dyn RelayObserver>) -> Self {
        Self { registry, observer }
    }

    /// `exclude` 以外の全セッションへ送信
    ///
    /// 送信に失敗したセッションは削除され、1 件でも削除があれば名簿を 1 回だけ再配信する。
    pub async fn broadcast(
        &self,
        message: &Message,
        exclude: Option<&SessionKey>,
    ) -> Result<BroadcastReport, BroadcastError> {
        let report = self.fan_out(message, exclude).await?;
        if !report.evicted.is_empty() {
            self.broadcast_roster().await?;
        }
        Ok(report)
    }

    /// 現在の名簿を全セッションへ送信
    ///
    /// ここで起きた送信失敗も削除されるが、名簿の再配信は行わない。
    pub async fn broadcast_roster(&self) -> Result<BroadcastReport, BroadcastError> {
        let roster = self.roster_message().await;
        self.fan_out(&roster, None).await
    }

    /// 現在の名簿（`user_list`）
    pub async fn roster_message(&self) -> Message {
        let sessions = self.registry.snapshot().await;
        Message::UserList(UserListBroadcast {
            users: build_user_list(&sessions),
        })
    }

    /// 1 つのセッションだけに送信。届いた場合は `true`
    pub async fn unicast(
        &self,
        key: &SessionKey,
        message: &Message,
    ) -> Result<bool, BroadcastError> {
        let frame = encode(message)?;
        let Some(session) = self.registry.get(key).await else {
            tracing::debug!("Skip '{}' frame to unknown session '{}'", message.kind(), key);
            return Ok(false);
        };

        match session.sink().send(&frame).await {
            Ok(()) => Ok(true),
            Err(e) => {
                if self.evict(key, &e).await {
                    self.broadcast_roster().await?;
                }
                Ok(false)
            }
        }
    }

    async fn fan_out(
        &self,
        message: &Message,
        exclude: Option<&SessionKey>,
    ) -> Result<BroadcastReport, BroadcastError> {
        let frame = encode(message)?;
        let targets: Vec<Session> = self
            .registry
            .snapshot()
            .await
            .into_iter()
            .filter(|session| Some(&session.key) != exclude)
            .collect();

        let results = join_all(targets.iter().map(|session| {
            let frame = &frame;
            async move { (session.key, session.sink().send(frame).await) }
        }))
        .await;

        let mut report = BroadcastReport::default();
        for (key, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    self.evict(&key, &e).await;
                    report.evicted.push(key);
                }
            }
        }

        tracing::debug!(
            "Sent '{}' to {} session(s), evicted {}",
            message.kind(),
            report.delivered,
            report.evicted.len()
        );
        Ok(report)
    }

    /// 送信に失敗したセッションを削除。実際に削除した場合は `true`
    async fn evict(&self, key: &SessionKey, error: &DeliveryError) -> bool {
        tracing::warn!("Failed to send to '{}': {}", key, error);
        if self.registry.remove(key).await.is_some() {
            self.observer
                .on_event(RelayEvent::SessionEvicted { key: *key });
            true
        } else {
            false
        }
    }
}

fn encode(message: &Message) -> Result<Vec<u8>, BroadcastError> {
    message.encode().map_err(|source| BroadcastError::Encode {
        kind: message.kind(),
        source,
    })
}
