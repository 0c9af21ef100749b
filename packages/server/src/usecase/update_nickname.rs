//! UseCase: ニックネーム更新（`user_update`）
//!
//! メッセージの `ip` フィールドは使わない。セッションの識別は接続元アドレスで行う。

use std::sync::Arc;

use lanrelay_shared::protocol::UserUpdate;

use crate::domain::{RelayEvent, RelayObserver, SessionKey, SessionRegistry};

use super::{broadcast::BroadcastEngine, error::BroadcastError};

/// ニックネーム更新のユースケース
pub struct UpdateNicknameUseCase {
    registry: Arc<dyn SessionRegistry>,
    broadcast: Arc<BroadcastEngine>,
    observer: Arc<dyn RelayObserver>,
}

impl UpdateNicknameUseCase {
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

    /// ニックネームを更新し、名簿を 1 回配信する。
    /// セッションが存在しなければ何もせず `false` を返す。
    pub async fn execute(&self, key: SessionKey, update: UserUpdate) -> Result<bool, BroadcastError> {
        let nickname = update.nickname;
        if !self.registry.update_nickname(&key, nickname.clone()).await {
            tracing::debug!("Nickname update from unknown session '{}'", key);
            return Ok(false);
        }

        self.observer
            .on_event(RelayEvent::NicknameChanged { key, nickname });
        self.broadcast.broadcast_roster().await?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infrastructure::registry::InMemorySessionRegistry,
        test_support::{RecordingObserver, drain_frames, key, register_channel_session},
    };
    use lanrelay_shared::protocol::{Message, UserEntry};

    #[tokio::test]
    async fn test_update_nickname_broadcasts_roster_once() {
        // テスト項目: ニックネーム更新後、各セッションに名簿がちょうど 1 回届く
        // given (前提条件):
        let registry: Arc<dyn SessionRegistry> = Arc::new(InMemorySessionRegistry::new());
        let observer = Arc::new(RecordingObserver::default());
        let broadcast = Arc::new(BroadcastEngine::new(registry.clone(), observer.clone()));
        let usecase = UpdateNicknameUseCase::new(registry.clone(), broadcast, observer.clone());
        let mut rx_a = register_channel_session(&registry, key(1)).await;
        let mut rx_b = register_channel_session(&registry, key(2)).await;

        // when (操作):
        let updated = usecase
            .execute(
                key(1),
                UserUpdate {
                    nickname: "Ann".to_string(),
                    ip: "192.168.0.99".to_string(),
                    timestamp: None,
                },
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert!(updated);
        for rx in [&mut rx_a, &mut rx_b] {
            let frames = drain_frames(rx);
            assert_eq!(frames.len(), 1);
            let Message::UserList(roster) = Message::decode(&frames[0]).unwrap() else {
                panic!("expected user_list");
            };
            assert!(roster.users.contains(&UserEntry {
                ip: "10.0.0.2".to_string(),
                nickname: "Ann".to_string(),
            }));
        }
        assert_eq!(
            observer.events(),
            vec![RelayEvent::NicknameChanged {
                key: key(1),
                nickname: "Ann".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_update_nickname_of_unknown_session() {
        // テスト項目: 未登録のセッションからの更新は無視される
        let registry: Arc<dyn SessionRegistry> = Arc::new(InMemorySessionRegistry::new());
        let observer = Arc::new(RecordingObserver::default());
        let broadcast = Arc::new(BroadcastEngine::new(registry.clone(), observer.clone()));
        let usecase = UpdateNicknameUseCase::new(registry.clone(), broadcast, observer.clone());

        let updated = usecase
            .execute(
                key(7),
                UserUpdate {
                    nickname: "Ghost".to_string(),
                    ip: "10.0.0.7".to_string(),
                    timestamp: None,
                },
            )
            .await
            .unwrap();

        assert!(!updated);
        assert!(observer.events().is_empty());
    }
}
