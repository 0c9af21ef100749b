//! UseCase: チャットメッセージの中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendChatUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 送信者を含む全セッションにメッセージが届くこと（ソケット経由・Web 経由とも同じ経路）
//! - Web 向けキューに整形済みのエントリが 1 件積まれること
//!
//! ### どのような状況を想定しているか
//! - 正常系：ソケットクライアントからのチャット
//! - 正常系：Web ページからのチャット（`source` が "web" になる）
//! - エッジケース：接続中のセッションが 0 件

use std::sync::Arc;

use lanrelay_shared::protocol::{ChatMessage, Message, WebChatEntry};

use crate::domain::{RelayEvent, RelayObserver, WebOutbox};

use super::{
    broadcast::{BroadcastEngine, BroadcastReport},
    error::BroadcastError,
};

/// チャット中継のユースケース
pub struct SendChatUseCase {
    /// BroadcastEngine（ソケットクライアントへの配信）
    broadcast: Arc<BroadcastEngine>,
    /// WebOutbox（ブラウザ向けの配信待ちキュー）
    web_outbox: Arc<dyn WebOutbox>,
    /// RelayObserver（イベント通知）
    observer: Arc<dyn RelayObserver>,
}

impl SendChatUseCase {
    /// 新しい SendChatUseCase を作成
    pub fn new(
        broadcast: Arc<BroadcastEngine>,
        web_outbox: Arc<dyn WebOutbox>,
        observer: Arc<dyn RelayObserver>,
    ) -> Self {
        Self {
            broadcast,
            web_outbox,
            observer,
        }
    }

    /// チャットを中継
    ///
    /// # Arguments
    ///
    /// * `message` - 検証済みのチャットメッセージ
    ///
    /// # Returns
    ///
    /// * `Ok(BroadcastReport)` - ソケットクライアントへの配信結果
    /// * `Err(BroadcastError)` - フレームを作れなかった
    pub async fn execute(&self, message: ChatMessage) -> Result<BroadcastReport, BroadcastError> {
        let web_entry = WebChatEntry::from(&message);
        let nickname = message.nickname.clone();
        let content = message.content.clone();

        // 1. 送信者を含む全セッションへ配信
        let report = self
            .broadcast
            .broadcast(&Message::Chat(message), None)
            .await?;

        // 2. Web 向けキューに積む
        match serde_json::to_string(&web_entry) {
            Ok(json) => self.web_outbox.push(json).await,
            Err(e) => tracing::warn!("Failed to encode web chat entry: {}", e),
        }

        self.observer.on_event(RelayEvent::ChatRelayed {
            nickname,
            content,
            delivered: report.delivered,
        });

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::SessionRegistry,
        infrastructure::{outbox::InMemoryWebOutbox, registry::InMemorySessionRegistry},
        test_support::{RecordingObserver, drain_frames, key, register_channel_session},
    };

    struct Fixture {
        registry: Arc<dyn SessionRegistry>,
        outbox: Arc<InMemoryWebOutbox>,
        observer: Arc<RecordingObserver>,
        usecase: SendChatUseCase,
    }

    fn create_fixture() -> Fixture {
        let registry: Arc<dyn SessionRegistry> = Arc::new(InMemorySessionRegistry::new());
        let outbox = Arc::new(InMemoryWebOutbox::new());
        let observer = Arc::new(RecordingObserver::default());
        let broadcast = Arc::new(BroadcastEngine::new(registry.clone(), observer.clone()));
        let usecase = SendChatUseCase::new(broadcast, outbox.clone(), observer.clone());
        Fixture {
            registry,
            outbox,
            observer,
            usecase,
        }
    }

    fn socket_chat() -> ChatMessage {
        ChatMessage {
            sender_ip: "10.0.0.2".to_string(),
            nickname: "Bob".to_string(),
            timestamp: "2024-05-01 12:00:00".to_string(),
            content: "hi".to_string(),
            receiver: Some("all".to_string()),
            source: None,
        }
    }

    #[tokio::test]
    async fn test_chat_reaches_sender_and_others() {
        // テスト項目: 送信者自身を含む全セッションに 1 回ずつ届く
        // given (前提条件):
        let fixture = create_fixture();
        let mut rx_sender = register_channel_session(&fixture.registry, key(1)).await;
        let mut rx_other = register_channel_session(&fixture.registry, key(2)).await;

        // when (操作):
        let report = fixture.usecase.execute(socket_chat()).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        for rx in [&mut rx_sender, &mut rx_other] {
            let frames = drain_frames(rx);
            assert_eq!(frames.len(), 1);
            assert_eq!(
                Message::decode(&frames[0]).unwrap(),
                Message::Chat(socket_chat())
            );
        }
        assert!(matches!(
            fixture.observer.events().as_slice(),
            [RelayEvent::ChatRelayed { delivered: 2, .. }]
        ));
    }

    #[tokio::test]
    async fn test_socket_chat_is_queued_for_web_as_client_source() {
        // テスト項目: ソケット経由のチャットは source "client" で Web 向けキューに積まれる
        // given (前提条件):
        let fixture = create_fixture();

        // when (操作):
        fixture.usecase.execute(socket_chat()).await.unwrap();

        // then (期待する結果):
        let entry = fixture.outbox.pop().await.unwrap();
        let entry: WebChatEntry = serde_json::from_str(&entry).unwrap();
        assert_eq!(
            entry,
            WebChatEntry {
                timestamp: "2024-05-01 12:00:00".to_string(),
                nickname: "Bob".to_string(),
                content: "hi".to_string(),
                source: "client".to_string(),
            }
        );
        assert!(fixture.outbox.is_empty().await);
    }

    #[tokio::test]
    async fn test_web_chat_is_relayed_to_sockets() {
        // テスト項目: Web ページからのチャットもソケットクライアントに届き、source は "web"
        // given (前提条件):
        let fixture = create_fixture();
        let mut rx = register_channel_session(&fixture.registry, key(1)).await;
        let message = ChatMessage::from_web("Bob", "yo".to_string(), "t".to_string());

        // when (操作):
        fixture.usecase.execute(message).await.unwrap();

        // then (期待する結果):
        let frames = drain_frames(&mut rx);
        let Message::Chat(relayed) = Message::decode(&frames[0]).unwrap() else {
            panic!("expected message");
        };
        assert_eq!(relayed.sender_ip, "web_user");
        assert_eq!(relayed.nickname, "网页用户/Bob");

        let entry: WebChatEntry =
            serde_json::from_str(&fixture.outbox.pop().await.unwrap()).unwrap();
        assert_eq!(entry.source, "web");
    }
}
