//! Outbound stream halves
//!
//! Splits a dialed stream into an ordered chunk reader and a writer with an
//! idempotent close.

use crate::error::RelayError;
use bytes::{Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

/// Split an outbound stream into its reader and writer halves
///
/// `chunk_size` caps how many bytes one [`OutboundReader::next_chunk`] call
/// returns.
pub fn split_outbound<S>(stream: S, chunk_size: usize) -> (OutboundReader<S>, OutboundWriter<S>)
where
    S: AsyncRead + AsyncWrite,
{
    let (read_half, write_half) = tokio::io::split(stream);
    (
        OutboundReader {
            inner: read_half,
            buf: BytesMut::with_capacity(chunk_size),
            chunk_size,
        },
        OutboundWriter {
            inner: write_half,
            closed: false,
        },
    )
}

/// Read side of an outbound connection
pub struct OutboundReader<S> {
    inner: ReadHalf<S>,
    buf: BytesMut,
    chunk_size: usize,
}

impl<S: AsyncRead> OutboundReader<S> {
    /// Read the next chunk, `None` on EOF
    pub async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        self.buf.reserve(self.chunk_size);
        let n = (&mut self.inner)
            .take(self.chunk_size as u64)
            .read_buf(&mut self.buf)
            .await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf.split().freeze()))
    }
}

/// Write side of an outbound connection
pub struct OutboundWriter<S> {
    inner: WriteHalf<S>,
    closed: bool,
}

impl<S: AsyncWrite> OutboundWriter<S> {
    /// Write the whole buffer, returning the number of bytes written
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize, RelayError> {
        if self.closed {
            return Err(RelayError::WriteAfterClose("outbound transport"));
        }
        self.inner.write_all(buf).await?;
        Ok(buf.len())
    }

    /// Shut down the write side; later calls are no-ops
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.inner.shutdown().await {
            tracing::trace!("Outbound shutdown error ignored: {}", e);
        }
    }
}
