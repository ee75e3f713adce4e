//! Async TCP transport for the connector bridge.
//!
//! Every frame is a 4-byte big-endian length followed by a UTF-8 JSON body.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::errors::{Result, SessionError};

/// Length of the frame header.
pub const HEADER_LEN: usize = 4;

/// Largest accepted frame body. Security lists for a full exchange fit well
/// inside this.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Prefix `body` with its 4-byte big-endian length.
pub fn encode_frame(body: &[u8]) -> Result<Vec<u8>> {
    if body.is_empty() || body.len() > MAX_FRAME_LEN {
        return Err(SessionError::Encoding(format!(
            "invalid frame length: {}",
            body.len()
        )));
    }
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Dial the bridge and split the stream into reader and writer halves.
pub async fn connect(addr: &str) -> Result<(TransportReader, TransportWriter)> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| SessionError::Connection(format!("failed to connect to {addr}: {e}")))?;
    stream.set_nodelay(true)?;
    let (reader, writer) = stream.into_split();
    Ok((
        TransportReader {
            reader,
            read_buf: BytesMut::with_capacity(8192),
        },
        TransportWriter { writer },
    ))
}

// ============================================================================
// TransportReader
// ============================================================================

/// Read half of the bridge connection.
pub struct TransportReader {
    reader: OwnedReadHalf,
    read_buf: BytesMut,
}

impl TransportReader {
    /// Read a single complete frame body.
    ///
    /// Accumulates partial reads until the whole frame is buffered.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>> {
        while self.read_buf.len() < HEADER_LEN {
            let n = self.reader.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(SessionError::Disconnected(
                    "connection closed while reading frame header".into(),
                ));
            }
        }

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&self.read_buf[..HEADER_LEN]);
        let frame_len = u32::from_be_bytes(header) as usize;

        if frame_len == 0 || frame_len > MAX_FRAME_LEN {
            return Err(SessionError::Protocol(format!(
                "invalid frame length: {frame_len}"
            )));
        }

        let total_needed = HEADER_LEN + frame_len;
        while self.read_buf.len() < total_needed {
            let n = self.reader.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(SessionError::Disconnected(
                    "connection closed while reading frame body".into(),
                ));
            }
        }

        self.read_buf.advance(HEADER_LEN);
        Ok(self.read_buf.split_to(frame_len).to_vec())
    }
}

// ============================================================================
// TransportWriter
// ============================================================================

/// Write half of the bridge connection.
pub struct TransportWriter {
    writer: OwnedWriteHalf,
}

impl TransportWriter {
    /// Frame and send one body.
    pub async fn send_frame(&mut self, body: &[u8]) -> Result<()> {
        let frame = encode_frame(body)?;
        self.writer
            .write_all(&frame)
            .await
            .map_err(|e| SessionError::Connection(format!("failed to send: {e}")))?;
        Ok(())
    }

    /// Shut down the write half; the bridge sees EOF.
    pub async fn shutdown(&mut self) {
        let _ = self.writer.shutdown().await;
    }
}

// ============================================================================
// Tests
// ============================================================================
