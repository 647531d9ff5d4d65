//! Transport abstraction.
//!
//! A transport is any ordered, reliable byte stream. The stream never
//! looks past `AsyncRead`/`AsyncWrite`, so TCP, Unix sockets, TLS
//! wrappers and in-memory duplex pipes all work the same way.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;

use crate::core::Packet;
use crate::Result;

/// Byte stream a [`Stream`](crate::Stream) can be attached to.
///
/// Closing a transport means shutting down its write side and dropping
/// both halves.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

pub(crate) type BoxTransport = Box<dyn Transport>;

/// Identity of one attached transport.
///
/// Every `set_connection` call hands out a new id, so error reports can
/// be matched to the transport that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) fn next(counter: &AtomicU64) -> Self {
        Self(counter.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Write side of an attached transport, shared with the writer pump.
pub(crate) struct Connection {
    id: ConnectionId,
    writer: Mutex<WriteHalf<BoxTransport>>,
}

impl Connection {
    /// Splits `transport` and returns the write side plus the read side
    /// for the inbound pump.
    pub(crate) fn attach(id: ConnectionId, transport: BoxTransport) -> (Self, ReadHalf<BoxTransport>) {
        let (reader, writer) = tokio::io::split(transport);
        let connection = Self {
            id,
            writer: Mutex::new(writer),
        };
        (connection, reader)
    }

    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    pub(crate) async fn write_packet(&self, packet: &Packet, chunk_size: usize) -> Result<()> {
        let mut writer = self.writer.lock().await;
        crate::io::write_packet(&mut *writer, packet, chunk_size).await
    }

    pub(crate) async fn shutdown(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await?;
        Ok(())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish()
    }
}
