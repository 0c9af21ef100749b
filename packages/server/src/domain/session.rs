//! Session entity and roster helpers.

use std::{fmt, net::SocketAddr, sync::Arc};

use lanrelay_shared::protocol::{PLACEHOLDER_NICKNAME, UserEntry};

use super::sink::SessionSink;

/// Identity of one live connection: the peer's socket address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(SocketAddr);

impl SessionKey {
    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    /// IP part shown in the roster
    pub fn ip(&self) -> String {
        self.0.ip().to_string()
    }
}

impl From<SocketAddr> for SessionKey {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Server-side record of one live connection
#[derive(Clone)]
pub struct Session {
    pub key: SessionKey,
    pub nickname: String,
    /// Unix milliseconds
    pub connected_at: i64,
    /// Unix milliseconds of the last valid frame (or the connect time)
    pub last_seen_at: i64,
    sink: Arc<dyn SessionSink>,
}

impl Session {
    /// New session carrying the placeholder nickname
    pub fn new(key: SessionKey, sink: Arc<dyn SessionSink>, connected_at: i64) -> Self {
        Self {
            key,
            nickname: PLACEHOLDER_NICKNAME.to_string(),
            connected_at,
            last_seen_at: connected_at,
            sink,
        }
    }

    /// Send handle of the connection
    pub fn sink(&self) -> &Arc<dyn SessionSink> {
        &self.sink
    }

    pub fn user_entry(&self) -> UserEntry {
        UserEntry {
            ip: self.key.ip(),
            nickname: self.nickname.clone(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("nickname", &self.nickname)
            .field("connected_at", &self.connected_at)
            .field("last_seen_at", &self.last_seen_at)
            .finish_non_exhaustive()
    }
}

/// Build the roster from a registry snapshot.
///
/// Entries are ordered by connection time, then by address, so every session
/// sees the same list.
pub fn build_user_list(sessions: &[Session]) -> Vec<UserEntry> {
    let mut ordered: Vec<&Session> = sessions.iter().collect();
    ordered.sort_by(|a, b| {
        a.connected_at
            .cmp(&b.connected_at)
            .then_with(|| a.key.cmp(&b.key))
    });
    ordered.into_iter().map(Session::user_entry).collect()
}
