//! Per-connection task for desktop clients.

use std::{io, net::SocketAddr, sync::Arc};

use lanrelay_shared::protocol::{ACK, Message};
use tokio::net::{TcpStream, tcp::OwnedReadHalf};

use crate::{
    domain::{SessionKey, SessionSink},
    infrastructure::{
        framing::{Frame, FrameReader},
        sink::TcpSessionSink,
    },
    ui::state::AppState,
};

/// Serve one TCP connection until it closes.
///
/// The reader runs in its own task; however it ends (peer close, I/O error or
/// panic) the session is removed and the roster rebroadcast afterwards.
///
/// The roster goes out as soon as the session is registered, before the
/// `HELO` chunk is read. A client answering `HELO` therefore sees a
/// `user_list` document ahead of the `ACK`; one that reads exactly three bytes
/// and expects `ACK` fails its handshake against this server.
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, state: Arc<AppState>) {
    let key = SessionKey::new(peer);
    let (read_half, write_half) = stream.into_split();
    let sink: Arc<dyn SessionSink> = Arc::new(TcpSessionSink::new(write_half));

    if let Err(e) = state.connect_session.execute(key, sink.clone()).await {
        tracing::warn!("Failed to send roster after '{}' connected: {}", key, e);
    }

    let reader_state = state.clone();
    let reader_task = tokio::spawn(async move {
        read_loop(key, FrameReader::new(read_half), sink, reader_state).await
    });

    match reader_task.await {
        Ok(Ok(())) => tracing::debug!("Connection '{}' closed by peer", key),
        Ok(Err(e)) => tracing::warn!("Connection '{}' failed: {}", key, e),
        Err(e) => tracing::error!("Reader task for '{}' ended abnormally: {}", key, e),
    }

    if let Err(e) = state.disconnect_session.execute(key).await {
        tracing::warn!("Failed to send roster after '{}' left: {}", key, e);
    }
}

async fn read_loop(
    key: SessionKey,
    mut reader: FrameReader<OwnedReadHalf>,
    sink: Arc<dyn SessionSink>,
    state: Arc<AppState>,
) -> io::Result<()> {
    while let Some(frame) = reader.next_frame().await? {
        match frame {
            Frame::Handshake => {
                tracing::debug!("Handshake from '{}'", key);
                if let Err(e) = sink.send(ACK).await {
                    tracing::warn!("Failed to answer handshake from '{}': {}", key, e);
                    break;
                }
            }
            Frame::Document(bytes) => match Message::decode(&bytes) {
                Ok(message) => dispatch(&state, key, message, sink.as_ref(), &mut reader).await,
                Err(e) => tracing::warn!("Dropping malformed message from '{}': {}", key, e),
            },
            Frame::FileHeader(bytes) => match Message::decode(&bytes) {
                Ok(message @ Message::FileMeta(_)) => {
                    dispatch(&state, key, message, sink.as_ref(), &mut reader).await
                }
                Ok(other) => tracing::warn!(
                    "Expected file metadata before the end marker from '{}', got '{}'",
                    key,
                    other.kind()
                ),
                Err(e) => tracing::warn!("Dropping malformed file header from '{}': {}", key, e),
            },
            Frame::Discarded { reason, preview } => {
                tracing::warn!("Discarded input from '{}' ({}): {:?}", key, reason, preview);
            }
        }
    }
    Ok(())
}

async fn dispatch(
    state: &AppState,
    key: SessionKey,
    message: Message,
    reply: &dyn SessionSink,
    reader: &mut FrameReader<OwnedReadHalf>,
) {
    let kind = message.kind();
    if let Err(e) = state.dispatcher.dispatch(key, message, reply, reader).await {
        tracing::warn!("Failed to handle '{}' from '{}': {}", kind, key, e);
    }
}
