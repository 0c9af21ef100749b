//! InMemory Session Registry 実装
//!
//! ドメイン層が定義する SessionRegistry trait の具体的な実装。
//! `tokio::sync::Mutex` で保護した HashMap を使い、全ての操作を直列化します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use lanrelay_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{Session, SessionKey, SessionRegistry, SessionSink};

/// インメモリ Session Registry 実装
pub struct InMemorySessionRegistry {
    /// 接続中のセッション
    sessions: Mutex<HashMap<SessionKey, Session>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionRegistry {
    /// システム時計を使うレジストリを作成
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for InMemorySessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn register(&self, key: SessionKey, sink: Arc<dyn SessionSink>) -> Session {
        let session = Session::new(key, sink, self.clock.now_millis());
        let mut sessions = self.sessions.lock().await;
        if sessions.insert(key, session.clone()).is_some() {
            tracing::warn!("Session '{}' was already registered, replacing it", key);
        }
        tracing::debug!("Session '{}' registered ({} total)", key, sessions.len());
        session
    }

    async fn update_nickname(&self, key: &SessionKey, nickname: String) -> bool {
        let now = self.clock.now_millis();
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(key) {
            Some(session) => {
                session.nickname = nickname;
                session.last_seen_at = now;
                true
            }
            None => false,
        }
    }

    async fn touch(&self, key: &SessionKey) -> bool {
        let now = self.clock.now_millis();
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(key) {
            Some(session) => {
                session.last_seen_at = now;
                true
            }
            None => false,
        }
    }

    async fn remove(&self, key: &SessionKey) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        let removed = sessions.remove(key);
        if removed.is_some() {
            tracing::debug!("Session '{}' removed ({} left)", key, sessions.len());
        }
        removed
    }

    async fn get(&self, key: &SessionKey) -> Option<Session> {
        let sessions = self.sessions.lock().await;
        sessions.get(key).cloned()
    }

    async fn snapshot(&self) -> Vec<Session> {
        let sessions = self.sessions.lock().await;
        sessions.values().cloned().collect()
    }

    async fn count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.len()
    }
}
