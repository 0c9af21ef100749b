//! Connection to the relay server: handshake and outgoing messages.

use std::{
    path::Path,
    time::Duration,
};

use lanrelay_shared::{
    protocol::{
        ChatMessage, END_OF_JSON, FileMeta, HELO, Message, RECEIVER_ALL, RefreshRequest,
        UserUpdate,
    },
    time::wire_timestamp,
};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc,
};

use crate::{
    error::ClientError,
    incoming::{Incoming, IncomingReader},
};

/// Time allowed for connecting and the handshake
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed for the server to acknowledge a file header
pub const FILE_ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Size of the chunks a file payload is written in
pub const FILE_CHUNK_SIZE: usize = 4096;

/// An established connection, split for concurrent reading and writing
pub struct RelayConnection {
    pub writer: RelayWriter,
    pub reader: IncomingReader<OwnedReadHalf>,
    /// Messages that arrived before the handshake completed
    pub backlog: Vec<Message>,
}

/// Connect to `addr` and complete the `HELO` / `ACK` handshake
///
/// # Errors
///
/// - [`ClientError::Timeout`] if connecting and the handshake take longer than `timeout`
/// - [`ClientError::HandshakeFailed`] if the server answers with anything but `ACK`
pub async fn connect(
    addr: &str,
    nickname: &str,
    timeout: Duration,
) -> Result<RelayConnection, ClientError> {
    tokio::time::timeout(timeout, connect_and_handshake(addr, nickname))
        .await
        .map_err(|_| ClientError::Timeout(timeout))?
}

async fn connect_and_handshake(addr: &str, nickname: &str) -> Result<RelayConnection, ClientError> {
    let stream = TcpStream::connect(addr).await?;
    let local_ip = stream.local_addr()?.ip().to_string();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = IncomingReader::new(read_half);

    write_half.write_all(HELO).await?;
    write_half.flush().await?;

    // The server may push the roster before answering the handshake
    let mut backlog = Vec::new();
    loop {
        match reader.next().await? {
            Some(Incoming::Ack) => break,
            Some(Incoming::Message(message)) => backlog.push(message),
            Some(Incoming::Raw(raw)) => {
                return Err(ClientError::HandshakeFailed(format!(
                    "unexpected reply {raw:?}"
                )));
            }
            None => {
                return Err(ClientError::HandshakeFailed(
                    "server closed the connection".to_string(),
                ));
            }
        }
    }

    tracing::info!("Connected to {} as {}", addr, local_ip);

    Ok(RelayConnection {
        writer: RelayWriter {
            stream: write_half,
            local_ip,
            nickname: nickname.to_string(),
        },
        reader,
        backlog,
    })
}

/// Write half of a connection
pub struct RelayWriter {
    stream: OwnedWriteHalf,
    local_ip: String,
    nickname: String,
}

impl RelayWriter {
    /// IP address this client is seen under
    pub fn local_ip(&self) -> &str {
        &self.local_ip
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Announce the current nickname
    pub async fn send_user_update(&mut self) -> Result<(), ClientError> {
        let message = Message::UserUpdate(UserUpdate {
            nickname: self.nickname.clone(),
            ip: self.local_ip.clone(),
            timestamp: Some(wire_timestamp()),
        });
        self.write_message(&message).await
    }

    /// Change the nickname and announce it
    pub async fn set_nickname(&mut self, nickname: &str) -> Result<(), ClientError> {
        self.nickname = nickname.to_string();
        self.send_user_update().await
    }

    /// Send a chat line to everybody
    pub async fn send_chat(&mut self, content: &str) -> Result<ChatMessage, ClientError> {
        let chat = ChatMessage {
            sender_ip: self.local_ip.clone(),
            nickname: self.nickname.clone(),
            timestamp: wire_timestamp(),
            content: content.to_string(),
            receiver: Some(RECEIVER_ALL.to_string()),
            source: None,
        };
        self.write_message(&Message::Chat(chat.clone())).await?;
        Ok(chat)
    }

    /// Ask the server for the current roster
    pub async fn send_refresh_request(&mut self) -> Result<(), ClientError> {
        let message = Message::RefreshRequest(RefreshRequest {
            sender_ip: self.local_ip.clone(),
            timestamp: wire_timestamp(),
        });
        self.write_message(&message).await
    }

    /// Send a file: metadata and end marker, wait for `ACK`, then the payload.
    ///
    /// `acks` receives a signal for every `ACK` the read side sees.
    pub async fn send_file(
        &mut self,
        path: &Path,
        acks: &mut mpsc::UnboundedReceiver<()>,
    ) -> Result<FileMeta, ClientError> {
        let local_file = |source| ClientError::LocalFile {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::open(path).await.map_err(local_file)?;
        let file_size = file.metadata().await.map_err(local_file)?.len();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let meta = FileMeta {
            file_name,
            file_size,
            sender_ip: Some(self.local_ip.clone()),
            nickname: Some(self.nickname.clone()),
            timestamp: Some(wire_timestamp()),
            receiver: Some(RECEIVER_ALL.to_string()),
        };

        // Stale acknowledgements must not release this transfer
        while acks.try_recv().is_ok() {}

        let mut header = Message::FileMeta(meta.clone()).encode()?;
        header.extend_from_slice(END_OF_JSON);
        self.stream.write_all(&header).await?;
        self.stream.flush().await?;

        match tokio::time::timeout(FILE_ACK_TIMEOUT, acks.recv()).await {
            Ok(Some(())) => {}
            _ => return Err(ClientError::FileNotAcknowledged(meta.file_name)),
        }

        let mut sent: u64 = 0;
        let mut chunk = vec![0u8; FILE_CHUNK_SIZE];
        while sent < file_size {
            let n = file.read(&mut chunk).await.map_err(local_file)?;
            if n == 0 {
                break;
            }
            self.stream.write_all(&chunk[..n]).await?;
            sent += n as u64;
        }
        self.stream.flush().await?;

        tracing::debug!("Sent {} of {} bytes of '{}'", sent, file_size, meta.file_name);
        Ok(meta)
    }

    async fn write_message(&mut self, message: &Message) -> Result<(), ClientError> {
        let bytes = message.encode()?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
