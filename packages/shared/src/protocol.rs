//! Wire protocol shared by the relay server and its clients.
//!
//! Every frame on the TCP socket is a JSON document tagged by `type`. A file
//! transmission is the `file` document followed by [`END_OF_JSON`] and exactly
//! `file_size` raw bytes.
//!
//! There is no length prefix for ordinary documents: one socket read is taken as
//! one document. Adding a length prefix would break compatibility with existing
//! desktop clients and the web page, so the contract is kept as is.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker separating file metadata from the raw payload
pub const END_OF_JSON: &[u8] = b"<END_OF_JSON>";

/// Reply sent after a handshake and after file metadata
pub const ACK: &[u8] = b"ACK";

/// Handshake sent by a client right after connecting
pub const HELO: &[u8] = b"HELO";

/// Nickname a session carries until its first `user_update`
pub const PLACEHOLDER_NICKNAME: &str = "新用户";

/// `sender_ip` used for chat messages posted from the web page
pub const WEB_SENDER_IP: &str = "web_user";

/// Prefix put in front of nicknames submitted from the web page
pub const WEB_NICKNAME_PREFIX: &str = "网页用户/";

/// `source` value of chat messages posted from the web page
pub const WEB_SOURCE: &str = "web";

/// `source` value given to socket chat messages on the web stream
pub const CLIENT_SOURCE: &str = "client";

/// `receiver` value addressing everybody
pub const RECEIVER_ALL: &str = "all";

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Invalid JSON, unknown `type`, or a required field is missing
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One protocol message, tagged by its `type` field.
///
/// Decoding enforces the required fields of each type; anything else is a
/// [`ProtocolError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "user_update")]
    UserUpdate(UserUpdate),
    #[serde(rename = "message")]
    Chat(ChatMessage),
    #[serde(rename = "file")]
    FileMeta(FileMeta),
    #[serde(rename = "get_user_list")]
    RefreshRequest(RefreshRequest),
    /// Server to client only
    #[serde(rename = "user_list")]
    UserList(UserListBroadcast),
    /// Server to client only
    #[serde(rename = "system")]
    System(SystemNotification),
}

impl Message {
    /// Decode one JSON document
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode as one JSON document
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Value of the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Message::UserUpdate(_) => "user_update",
            Message::Chat(_) => "message",
            Message::FileMeta(_) => "file",
            Message::RefreshRequest(_) => "get_user_list",
            Message::UserList(_) => "user_list",
            Message::System(_) => "system",
        }
    }

    /// Whether a client is allowed to send this message to the server
    pub fn is_client_message(&self) -> bool {
        !matches!(self, Message::UserList(_) | Message::System(_))
    }
}

/// `user_update`: a session announces its nickname
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub nickname: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// `message`: a chat line.
///
/// `receiver` is carried through untouched; delivery is always to everybody.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_ip: String,
    pub nickname: String,
    pub timestamp: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ChatMessage {
    /// Chat message from the web page, as posted through the bridge
    pub fn from_web(nickname: &str, content: String, timestamp: String) -> Self {
        Self {
            sender_ip: WEB_SENDER_IP.to_string(),
            nickname: format!("{WEB_NICKNAME_PREFIX}{nickname}"),
            timestamp,
            content,
            receiver: Some(RECEIVER_ALL.to_string()),
            source: Some(WEB_SOURCE.to_string()),
        }
    }
}

/// `file`: metadata preceding a raw payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    pub file_name: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
}

impl FileMeta {
    /// Name to show for the sender in notifications
    pub fn sender_label(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.sender_ip.as_deref())
            .unwrap_or(PLACEHOLDER_NICKNAME)
    }
}

/// `get_user_list`: ask for the current roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub sender_ip: String,
    pub timestamp: String,
}

/// `user_list`: the full roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserListBroadcast {
    pub users: Vec<UserEntry>,
}

/// One roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub ip: String,
    pub nickname: String,
}

/// `system`: a notice generated by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemNotification {
    pub content: String,
    pub timestamp: String,
}

/// Chat line as delivered on the web push stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebChatEntry {
    pub timestamp: String,
    pub nickname: String,
    pub content: String,
    pub source: String,
}

impl From<&ChatMessage> for WebChatEntry {
    fn from(message: &ChatMessage) -> Self {
        Self {
            timestamp: message.timestamp.clone(),
            nickname: message.nickname.clone(),
            content: message.content.clone(),
            source: message
                .source
                .clone()
                .unwrap_or_else(|| CLIENT_SOURCE.to_string()),
        }
    }
}
