//! Server state shared by the TCP connection tasks and the HTTP handlers.

use std::sync::Arc;

use lanrelay_shared::time::{Clock, SystemClock};

use crate::{
    domain::{ReceivedFileStore, RelayObserver, SessionRegistry, WebOutbox},
    usecase::{
        BroadcastEngine, ConnectSessionUseCase, DisconnectSessionUseCase, Dispatcher,
        ReceiveFileUseCase, RefreshUserListUseCase, SendChatUseCase, UpdateNicknameUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectSessionUseCase（セッション接続のユースケース）
    pub connect_session: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（セッション切断のユースケース）
    pub disconnect_session: Arc<DisconnectSessionUseCase>,
    /// Dispatcher（ソケットから届いたメッセージの振り分け）
    pub dispatcher: Arc<Dispatcher>,
    /// SendChatUseCase（Web ページからの投稿もここを通る）
    pub send_chat: Arc<SendChatUseCase>,
    /// WebOutbox（ブラウザ向けの配信待ちキュー）
    pub web_outbox: Arc<dyn WebOutbox>,
    /// Clock（Web から届いたチャットのタイムスタンプ）
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire the use cases on top of the given infrastructure.
    ///
    /// Order:
    /// 1. BroadcastEngine
    /// 2. session lifecycle use cases
    /// 3. message use cases and the Dispatcher
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        web_outbox: Arc<dyn WebOutbox>,
        store: Arc<dyn ReceivedFileStore>,
        observer: Arc<dyn RelayObserver>,
    ) -> Self {
        Self::with_clock(registry, web_outbox, store, observer, Arc::new(SystemClock))
    }

    pub fn with_clock(
        registry: Arc<dyn SessionRegistry>,
        web_outbox: Arc<dyn WebOutbox>,
        store: Arc<dyn ReceivedFileStore>,
        observer: Arc<dyn RelayObserver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // 1. BroadcastEngine
        let broadcast = Arc::new(BroadcastEngine::new(registry.clone(), observer.clone()));

        // 2. Session lifecycle
        let connect_session = Arc::new(ConnectSessionUseCase::new(
            registry.clone(),
            broadcast.clone(),
            observer.clone(),
        ));
        let disconnect_session = Arc::new(DisconnectSessionUseCase::new(
            registry.clone(),
            broadcast.clone(),
            observer.clone(),
        ));

        // 3. Messages
        let send_chat = Arc::new(SendChatUseCase::new(
            broadcast.clone(),
            web_outbox.clone(),
            observer.clone(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            Arc::new(UpdateNicknameUseCase::new(
                registry.clone(),
                broadcast.clone(),
                observer.clone(),
            )),
            send_chat.clone(),
            Arc::new(RefreshUserListUseCase::new(broadcast.clone())),
            Arc::new(ReceiveFileUseCase::new(
                store,
                broadcast,
                observer,
                clock.clone(),
            )),
        ));

        Self {
            connect_session,
            disconnect_session,
            dispatcher,
            send_chat,
            web_outbox,
            clock,
        }
    }
}
