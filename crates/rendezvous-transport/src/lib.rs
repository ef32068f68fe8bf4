//! Transport layer for Rendezvous.
//!
//! Provides the [`Transport`] and [`Connection`] traits plus a TCP
//! implementation that speaks the length-prefixed framing defined in
//! [`framing`].
//!
//! The matchmaking protocol mixes framed messages with a few raw
//! fixed-size blocks (the issued identifier, the 40-byte header), so a
//! [`Connection`] exposes both.
//!
//! # Feature Flags
//!
//! - `tcp` (default): TCP listener and connector via `tokio::net`

mod error;
pub mod framing;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
pub use framing::FrameConfig;
#[cfg(feature = "tcp")]
pub use tcp::{FramedConnection, TcpTransport};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single byte-stream connection owned by one session.
///
/// Every method takes `&mut self`: a connection is driven by exactly one
/// sequential task, so there is no internal locking.
pub trait Connection: Send + 'static {
    /// Sends one length-prefixed frame.
    fn send_frame(
        &mut self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next length-prefixed frame.
    ///
    /// Returns `Ok(None)` when the peer closes the stream cleanly between
    /// frames.
    fn recv_frame(
        &mut self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Writes bytes with no length prefix.
    fn send_raw(
        &mut self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Reads exactly `len` unframed bytes.
    ///
    /// A stream that ends early yields [`TransportError::Truncated`].
    fn recv_exact(
        &mut self,
        len: usize,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Shuts down the write half of the connection.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Returns the remote address in `ip:port` form.
    fn peer_addr(&self) -> &str;
}
