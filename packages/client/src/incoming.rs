//! Decoder for what the server sends: JSON documents and bare `ACK`s.
//!
//! The server writes frames back to back, so one read may hold several
//! documents, or a document may span reads; the buffer is split on document
//! boundaries rather than on reads.

use lanrelay_shared::protocol::{ACK, Message};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ClientError;

const READ_CHUNK_SIZE: usize = 4096;

/// One unit received from the server
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Reply to `HELO` or to a file header
    Ack,
    Message(Message),
    /// JSON with an unknown `type`, or bytes that are not JSON at all
    Raw(String),
}

pub struct IncomingReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R> IncomingReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }

    /// Next unit, or `None` once the server has closed the connection
    pub async fn next(&mut self) -> Result<Option<Incoming>, ClientError> {
        loop {
            if let Some(incoming) = self.split_next() {
                return Ok(Some(incoming));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                if self.buf.iter().all(u8::is_ascii_whitespace) {
                    return Ok(None);
                }
                return Ok(Some(self.take_raw()));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn split_next(&mut self) -> Option<Incoming> {
        let start = self
            .buf
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(self.buf.len());
        self.buf.drain(..start);

        if self.buf.is_empty() || (self.buf.len() < ACK.len() && ACK.starts_with(&self.buf)) {
            return None;
        }
        if self.buf.starts_with(ACK) {
            self.buf.drain(..ACK.len());
            return Some(Incoming::Ack);
        }
        if self.buf[0] != b'{' {
            return Some(self.take_raw());
        }

        let (first, end) = {
            let mut documents =
                serde_json::Deserializer::from_slice(&self.buf).into_iter::<serde_json::Value>();
            let first = documents.next();
            (first, documents.byte_offset())
        };
        match first {
            Some(Ok(_)) => {
                let document: Vec<u8> = self.buf.drain(..end).collect();
                Some(match Message::decode(&document) {
                    Ok(message) => Incoming::Message(message),
                    Err(_) => Incoming::Raw(String::from_utf8_lossy(&document).into_owned()),
                })
            }
            Some(Err(e)) if e.is_eof() => None,
            Some(Err(_)) => Some(self.take_raw()),
            None => None,
        }
    }

    fn take_raw(&mut self) -> Incoming {
        let raw = String::from_utf8_lossy(&self.buf).trim().to_string();
        self.buf.clear();
        Incoming::Raw(raw)
    }
}
