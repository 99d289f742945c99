//! TCP transport with length-prefixed framing.
//!
//! Every frame on the wire is a 4-byte big-endian length followed by
//! that many payload bytes:
//!
//! ```text
//! ┌──────────────┬──────────────────────────┐
//! │ len: u32 BE  │ payload (len bytes)      │
//! └──────────────┴──────────────────────────┘
//! ```

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Connector, TransportError};

/// Largest frame accepted by default, in bytes.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// A [`Connector`] that opens plain TCP connections.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnector {
    max_frame_len: usize,
}

impl TcpConnector {
    /// Creates a connector with the default frame limit.
    pub fn new() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Sets the largest frame (in bytes) connections will send or accept.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Returns the configured frame limit.
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for TcpConnector {
    type Connection = TcpConnection;

    async fn connect(
        &self,
        address: &str,
        port: u16,
    ) -> Result<Self::Connection, TransportError> {
        let stream = TcpStream::connect((address, port)).await.map_err(
            |source| TransportError::ConnectFailed {
                addr: format!("{address}:{port}"),
                source,
            },
        )?;
        TcpConnection::from_stream(stream, self.max_frame_len)
    }
}

/// A single framed TCP connection.
///
/// The read and write halves are locked independently so a pending
/// `recv` never blocks a `send` on the same connection.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    max_frame_len: usize,
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpConnection {
    /// Wraps an already-connected stream.
    ///
    /// Used by [`TcpConnector`] on the client side, and by services (or
    /// test doubles) wrapping an accepted stream.
    pub fn from_stream(
        stream: TcpStream,
        max_frame_len: usize,
    ) -> Result<Self, TransportError> {
        let peer = stream
            .peer_addr()
            .map_err(|e| TransportError::ConnectionClosed(e.to_string()))?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "failed to set TCP_NODELAY");
        }
        let (reader, writer) = stream.into_split();
        let id = ConnectionId::next();
        tracing::debug!(%id, %peer, "TCP connection established");

        Ok(Self {
            id,
            peer,
            max_frame_len,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        })
    }

    /// Returns the remote peer's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for TcpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if data.len() > self.max_frame_len {
            return Err(TransportError::FrameTooLarge {
                len: data.len(),
                max: self.max_frame_len,
            });
        }
        let len = u32::try_from(data.len()).map_err(|_| {
            TransportError::FrameTooLarge {
                len: data.len(),
                max: u32::MAX as usize,
            }
        })?;

        // One contiguous buffer so the prefix and payload go out in a
        // single write.
        let mut frame = Vec::with_capacity(4 + data.len());
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(data);

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&frame)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut reader = self.reader.lock().await;

        let len = match reader.read_u32().await {
            Ok(len) => len as usize,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(None);
            }
            Err(e) => return Err(TransportError::ReceiveFailed(e)),
        };
        if len > self.max_frame_len {
            return Err(TransportError::FrameTooLarge {
                len,
                max: self.max_frame_len,
            });
        }

        let mut buf = vec![0u8; len];
        reader
            .read_exact(&mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        Ok(Some(buf))
    }

    async fn close(&self) -> Result<(), TransportError> {
        tracing::debug!(id = %self.id, peer = %self.peer, "closing TCP connection");
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
