//! Transport over any tokio byte stream.

use bytes::{Bytes, BytesMut};
use log::trace;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::Transport;
use crate::error::{Result, TransportError};

/// Adapts an `AsyncRead + AsyncWrite` stream (TCP socket, serial port,
/// `tokio::io::duplex` pipe) into a [`Transport`].
#[derive(Debug)]
pub struct IoTransport<S> {
    stream: S,
    read_size: usize,
}

impl<S> IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_size: 4096,
        }
    }

    /// Set the maximum number of bytes pulled per read.
    pub fn with_read_size(mut self, read_size: usize) -> Self {
        self.read_size = read_size.max(1);
        self
    }

    /// Unwrap the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Transport for IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(data)
            .await
            .map_err(TransportError::Io)?;
        self.stream.flush().await.map_err(TransportError::Io)?;
        Ok(())
    }

    async fn read_available(&mut self) -> Result<Option<Bytes>> {
        let mut buf = BytesMut::zeroed(self.read_size);
        let n = self
            .stream
            .read(&mut buf)
            .await
            .map_err(TransportError::Io)?;

        if n == 0 {
            trace!("io transport: end of stream");
            return Ok(None);
        }

        buf.truncate(n);
        Ok(Some(buf.freeze()))
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(TransportError::Io)?;
        Ok(())
    }
}
