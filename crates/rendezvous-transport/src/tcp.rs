//! TCP transport using `tokio::net`.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::framing::{self, FrameConfig};
use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
    frame: FrameConfig,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str, frame: FrameConfig) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener, frame })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpTransport {
    type Connection = FramedConnection<TcpStream>;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%addr, error = %e, "failed to set TCP_NODELAY");
        }

        let conn = FramedConnection::new(stream, addr.to_string(), self.frame.clone());
        tracing::debug!(id = %conn.id(), %addr, "accepted TCP connection");
        Ok(conn)
    }
}

/// A framed connection over any async byte stream.
///
/// Production code wraps a [`TcpStream`]; tests wrap one end of
/// `tokio::io::duplex`.
pub struct FramedConnection<S> {
    id: ConnectionId,
    peer: String,
    stream: S,
    frame: FrameConfig,
}

impl<S> FramedConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps an already-established stream.
    pub fn new(stream: S, peer: impl Into<String>, frame: FrameConfig) -> Self {
        Self {
            id: ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)),
            peer: peer.into(),
            stream,
            frame,
        }
    }
}

impl FramedConnection<TcpStream> {
    /// Dials a server and wraps the resulting stream.
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        frame: FrameConfig,
    ) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let peer = stream
            .peer_addr()
            .map_err(TransportError::AcceptFailed)?
            .to_string();
        Ok(Self::new(stream, peer, frame))
    }
}

impl<S> Connection for FramedConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send_frame(&mut self, data: &[u8]) -> Result<(), TransportError> {
        framing::write_frame(&mut self.stream, data, &self.frame).await
    }

    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        match framing::read_frame(&mut self.stream, &self.frame).await {
            Ok(data) => Ok(Some(data)),
            Err(TransportError::ConnectionClosed) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send_raw(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stream
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)?;
        self.stream.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv_exact(&mut self, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; len];
        let received = framing::read_full(&mut self.stream, &mut buf).await?;
        if received != len {
            return Err(TransportError::Truncated {
                expected: len,
                received,
            });
        }
        Ok(buf)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> &str {
        &self.peer
    }
}
