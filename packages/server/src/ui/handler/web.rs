//! Web bridge handlers: the built-in page, the push stream and the post endpoint.
//!
//! - `GET /`       : HTML/JS ページ
//! - `GET /stream` : `text/event-stream`。Web 向けキューのエントリを 1 件ずつ `data:` で送る
//! - `POST /send`  : フォーム (`message`, `nickname`) を受け取り、チャットとして中継する

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::{Form, State, rejection::FormRejection},
    http::StatusCode,
    response::{
        Html,
        sse::{Event, Sse},
    },
};
use futures_util::stream::{self, Stream};
use lanrelay_shared::protocol::ChatMessage;
use serde::Deserialize;
use uuid::Uuid;

use crate::{domain::WebOutbox, ui::state::AppState};

/// Delay between polls of an empty outbox
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Form posted by the web page
#[derive(Debug, Default, Deserialize)]
pub struct SendForm {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub nickname: String,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Logs when a viewer's stream is dropped
struct Viewer {
    id: Uuid,
}

impl Drop for Viewer {
    fn drop(&mut self) {
        tracing::info!("Web viewer {} disconnected", self.id);
    }
}

pub async fn stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let viewer = Viewer { id: Uuid::new_v4() };
    tracing::info!("Web viewer {} connected", viewer.id);

    let events = stream::unfold(
        (state.web_outbox.clone(), viewer),
        |(outbox, viewer)| async move {
            let entry = next_entry(outbox.as_ref()).await;
            Some((Ok(Event::default().data(entry)), (outbox, viewer)))
        },
    );
    Sse::new(events)
}

/// Wait for the next outbox entry, polling while the queue is empty
async fn next_entry(outbox: &dyn WebOutbox) -> String {
    loop {
        if let Some(entry) = outbox.pop().await {
            return entry;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    form: Result<Form<SendForm>, FormRejection>,
) -> StatusCode {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            tracing::warn!("Unreadable form on /send: {}", e);
            SendForm::default()
        }
    };

    if form.message.is_empty() {
        return StatusCode::OK;
    }

    let chat = ChatMessage::from_web(&form.nickname, form.message, state.clock.now_wire());
    if let Err(e) = state.send_chat.execute(chat).await {
        tracing::warn!("Failed to relay web message: {}", e);
    }
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::SessionRegistry,
        infrastructure::{outbox::InMemoryWebOutbox, registry::InMemorySessionRegistry},
        test_support::{
            MemoryFileStore, RecordingObserver, drain_frames, key, register_channel_session,
        },
    };
    use lanrelay_shared::{
        protocol::{Message, WebChatEntry},
        time::{Clock, FixedClock},
    };

    #[tokio::test]
    async fn test_web_post_uses_injected_clock() {
        // テスト項目: Web から投稿したチャットのタイムスタンプはサーバーの時計から取られる
        // given (前提条件):
        let clock = FixedClock::new(1_672_498_800_000);
        let registry: Arc<dyn SessionRegistry> = Arc::new(InMemorySessionRegistry::new());
        let state = Arc::new(AppState::with_clock(
            registry.clone(),
            Arc::new(InMemoryWebOutbox::new()),
            Arc::new(MemoryFileStore::default()),
            Arc::new(RecordingObserver::default()),
            Arc::new(clock),
        ));
        let mut rx = register_channel_session(&registry, key(1)).await;
        let form = SendForm {
            message: "hi".to_string(),
            nickname: "Bob".to_string(),
        };

        // when (操作):
        let status = send(State(state.clone()), Ok(Form(form))).await;

        // then (期待する結果):
        assert_eq!(status, StatusCode::OK);
        let expected = clock.now_wire();

        let entry = state.web_outbox.pop().await.unwrap();
        let entry: WebChatEntry = serde_json::from_str(&entry).unwrap();
        assert_eq!(entry.timestamp, expected);

        let frames = drain_frames(&mut rx);
        assert_eq!(frames.len(), 1);
        let Message::Chat(chat) = Message::decode(&frames[0]).unwrap() else {
            panic!("expected chat");
        };
        assert_eq!(chat.timestamp, expected);
    }
}
