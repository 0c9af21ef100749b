//! Dispatcher: デコード済みメッセージを種類ごとのユースケースへ振り分ける
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - Dispatcher::dispatch() メソッド
//!
//! ### なぜこのテストが必要か
//! - `user_update` 1 件につき名簿の配信がちょうど 1 回であること
//! - `get_user_list` の返信が要求者にだけ届くこと
//! - サーバーからクライアント向けの種類が受信側で無視されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：user_update / message / get_user_list / file
//! - 異常系：クライアントが user_list や system を送ってきた

use std::sync::Arc;

use lanrelay_shared::protocol::Message;

use crate::domain::{PayloadSource, SessionKey, SessionRegistry, SessionSink};

use super::{
    broadcast::BroadcastReport,
    error::DispatchError,
    receive_file::{FileReceipt, ReceiveFileUseCase},
    refresh_user_list::RefreshUserListUseCase,
    send_chat::SendChatUseCase,
    update_nickname::UpdateNicknameUseCase,
};

/// ディスパッチの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    NicknameUpdated(bool),
    ChatRelayed(BroadcastReport),
    FileReceived(FileReceipt),
    RosterSent(bool),
    /// サーバーからクライアント向けの種類
    Ignored(&'static str),
}

/// 1 セッションから届いたメッセージのルーター
pub struct Dispatcher {
    registry: Arc<dyn SessionRegistry>,
    update_nickname: Arc<UpdateNicknameUseCase>,
    send_chat: Arc<SendChatUseCase>,
    refresh_user_list: Arc<RefreshUserListUseCase>,
    receive_file: Arc<ReceiveFileUseCase>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        update_nickname: Arc<UpdateNicknameUseCase>,
        send_chat: Arc<SendChatUseCase>,
        refresh_user_list: Arc<RefreshUserListUseCase>,
        receive_file: Arc<ReceiveFileUseCase>,
    ) -> Self {
        Self {
            registry,
            update_nickname,
            send_chat,
            refresh_user_list,
            receive_file,
        }
    }

    /// メッセージを振り分ける
    ///
    /// 受理したメッセージはセッションの最終受信時刻を更新する。
    /// `file` の場合は `reply` に ACK を返し、`payload` からペイロードを読み取る。
    pub async fn dispatch(
        &self,
        key: SessionKey,
        message: Message,
        reply: &dyn SessionSink,
        payload: &mut dyn PayloadSource,
    ) -> Result<DispatchOutcome, DispatchError> {
        let kind = message.kind();
        if !message.is_client_message() {
            tracing::warn!("Ignoring server-only '{}' message from '{}'", kind, key);
            return Ok(DispatchOutcome::Ignored(kind));
        }

        self.registry.touch(&key).await;

        let outcome = match message {
            Message::UserUpdate(update) => {
                DispatchOutcome::NicknameUpdated(self.update_nickname.execute(key, update).await?)
            }
            Message::Chat(chat) => DispatchOutcome::ChatRelayed(self.send_chat.execute(chat).await?),
            Message::FileMeta(meta) => DispatchOutcome::FileReceived(
                self.receive_file.execute(key, reply, meta, payload).await?,
            ),
            Message::RefreshRequest(_) => {
                DispatchOutcome::RosterSent(self.refresh_user_list.execute(key).await?)
            }
            Message::UserList(_) | Message::System(_) => DispatchOutcome::Ignored(kind),
        };
        Ok(outcome)
    }
}
