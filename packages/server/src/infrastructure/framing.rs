//! Frame reader: turns a connection's byte stream into protocol frames.
//!
//! Two framing modes share one connection:
//!
//! - a chunk starting with `{` is one JSON document; a document cut short by
//!   the read boundary is buffered until the rest arrives;
//! - a `file` document is followed by [`END_OF_JSON`] and the raw payload. The
//!   reader splits at the marker and keeps whatever follows it as the start
//!   of the payload, which is then drained through [`PayloadSource`].
//!
//! Two documents arriving in one read are not split; the chunk is discarded
//! like any other malformed input. When pending bytes turn out to be malformed
//! only once the next read arrives, and that read starts a new document, only
//! the pending bytes are discarded.

use std::{fmt, io};

use async_trait::async_trait;
use lanrelay_shared::protocol::{END_OF_JSON, HELO};
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::domain::PayloadSource;

/// Bytes requested from the socket per read
pub const READ_CHUNK_SIZE: usize = 4096;

/// Pending bytes without a complete frame before they are thrown away
pub const MAX_PENDING_FRAME: usize = 1024 * 1024;

const PREVIEW_LEN: usize = 50;

/// One unit read from a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The `HELO` handshake
    Handshake,
    /// One JSON document
    Document(Vec<u8>),
    /// File metadata; the payload follows in the reader
    FileHeader(Vec<u8>),
    /// Input that could not be framed
    Discarded {
        reason: DiscardReason,
        preview: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    NotJson,
    InvalidJson,
    TrailingData,
    MissingFileMarker,
    Oversized,
    Incomplete,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DiscardReason::NotJson => "not a JSON document",
            DiscardReason::InvalidJson => "invalid JSON",
            DiscardReason::TrailingData => "trailing data after document",
            DiscardReason::MissingFileMarker => "file metadata without end marker",
            DiscardReason::Oversized => "frame too large",
            DiscardReason::Incomplete => "connection closed mid-document",
        };
        f.write_str(reason)
    }
}

#[derive(Deserialize)]
struct TypeTag {
    #[serde(rename = "type", default)]
    kind: Option<serde_json::Value>,
}

impl TypeTag {
    fn is_file(&self) -> bool {
        matches!(&self.kind, Some(serde_json::Value::String(kind)) if kind == "file")
    }
}

enum Step {
    Ready(Frame),
    NeedMore,
}

pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
    /// Start of the latest read in `buf` while earlier bytes are still pending
    last_read_at: Option<usize>,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            last_read_at: None,
        }
    }

    /// Next frame, or `None` once the peer has closed the connection
    pub async fn next_frame(&mut self) -> io::Result<Option<Frame>> {
        loop {
            if let Step::Ready(frame) = self.classify() {
                return Ok(Some(frame));
            }
            if self.buf.len() > MAX_PENDING_FRAME {
                return Ok(Some(self.discard(DiscardReason::Oversized)));
            }
            if self.fill().await? == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.discard(DiscardReason::Incomplete)));
            }
        }
    }

    async fn fill(&mut self) -> io::Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let n = self.inner.read(&mut chunk).await?;
        self.last_read_at = (!self.buf.is_empty()).then_some(self.buf.len());
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(n)
    }

    fn classify(&mut self) -> Step {
        let start = self
            .buf
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(self.buf.len());
        self.buf.drain(..start);
        self.last_read_at = self
            .last_read_at
            .and_then(|at| at.checked_sub(start))
            .filter(|at| *at > 0);

        if self.buf.is_empty() {
            return Step::NeedMore;
        }
        if self.buf.starts_with(HELO) {
            self.buf.drain(..HELO.len());
            self.last_read_at = None;
            return Step::Ready(Frame::Handshake);
        }
        if HELO.starts_with(&self.buf) {
            return Step::NeedMore;
        }
        if self.buf[0] != b'{' {
            return Step::Ready(self.discard(DiscardReason::NotJson));
        }

        let (first, end) = {
            let mut documents =
                serde_json::Deserializer::from_slice(&self.buf).into_iter::<TypeTag>();
            let first = documents.next();
            (first, documents.byte_offset())
        };

        match first {
            Some(Ok(tag)) => {
                let rest = &self.buf[end..];
                if rest.starts_with(END_OF_JSON) {
                    Step::Ready(self.split_file_header(end))
                } else if tag.is_file() {
                    if END_OF_JSON.starts_with(rest) {
                        Step::NeedMore
                    } else {
                        Step::Ready(self.discard_pending(DiscardReason::MissingFileMarker))
                    }
                } else if rest.iter().all(u8::is_ascii_whitespace) {
                    let document = self.buf[..end].to_vec();
                    self.buf.clear();
                    self.last_read_at = None;
                    Step::Ready(Frame::Document(document))
                } else {
                    Step::Ready(self.discard(DiscardReason::TrailingData))
                }
            }
            Some(Err(e)) => {
                if !e.is_eof() && self.new_document_started().is_some() {
                    Step::Ready(self.discard_pending(DiscardReason::InvalidJson))
                } else if let Some(pos) = find_marker(&self.buf) {
                    Step::Ready(self.split_file_header(pos))
                } else if e.is_eof() {
                    Step::NeedMore
                } else {
                    Step::Ready(self.discard(DiscardReason::InvalidJson))
                }
            }
            None => Step::NeedMore,
        }
    }

    fn split_file_header(&mut self, marker_at: usize) -> Frame {
        let header = self.buf[..marker_at].to_vec();
        self.buf.drain(..marker_at + END_OF_JSON.len());
        self.last_read_at = None;
        Frame::FileHeader(header)
    }

    /// Start of the latest read if it opens a new document after pending bytes
    fn new_document_started(&self) -> Option<usize> {
        let at = self.last_read_at?;
        let first = self.buf[at..].iter().find(|b| !b.is_ascii_whitespace())?;
        (*first == b'{').then_some(at)
    }

    /// Discard the bytes pending before the latest read when that read starts a
    /// new document, otherwise the whole buffer
    fn discard_pending(&mut self, reason: DiscardReason) -> Frame {
        let Some(at) = self.new_document_started() else {
            return self.discard(reason);
        };
        let frame = Self::discarded(&self.buf[..at], reason);
        self.buf.drain(..at);
        self.last_read_at = None;
        frame
    }

    fn discard(&mut self, reason: DiscardReason) -> Frame {
        let frame = Self::discarded(&self.buf, reason);
        self.buf.clear();
        self.last_read_at = None;
        frame
    }

    fn discarded(bytes: &[u8], reason: DiscardReason) -> Frame {
        let shown = bytes.len().min(PREVIEW_LEN);
        let preview = String::from_utf8_lossy(&bytes[..shown]).into_owned();
        Frame::Discarded { reason, preview }
    }
}

fn find_marker(buf: &[u8]) -> Option<usize> {
    buf.windows(END_OF_JSON.len())
        .position(|window| window == END_OF_JSON)
}

#[async_trait]
impl<R> PayloadSource for FrameReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read_payload_chunk(&mut self, limit: usize) -> io::Result<Option<Vec<u8>>> {
        if !self.buf.is_empty() {
            let take = limit.min(self.buf.len());
            return Ok(Some(self.buf.drain(..take).collect()));
        }
        let mut chunk = vec![0u8; limit.clamp(1, READ_CHUNK_SIZE)];
        let n = self.inner.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        chunk.truncate(n);
        Ok(Some(chunk))
    }
}
