//! Transport abstraction layer for Parley.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! byte-stream listeners, plus the [`TcpTransport`] implementation the
//! server binds to each port.
//!
//! A connection is handed to the session layer as a pair of split
//! halves: the session reads frames from one and writes frames to the
//! other from two independent loops.

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};

/// Opaque identifier for a connection.
///
/// Assigned from a monotonically increasing counter when a connection is
/// accepted. The room keys its membership on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
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

    /// Stops accepting new connections. Later calls to `accept` fail
    /// with [`TransportError::Shutdown`].
    fn shutdown(&self) -> impl Future<Output = ()> + Send;

    /// Returns the address this transport is listening on.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// A single accepted byte-stream connection.
pub trait Connection: Send + 'static {
    /// Read half produced by [`Connection::into_split`].
    type Reader: AsyncRead + Send + Unpin + 'static;
    /// Write half produced by [`Connection::into_split`].
    type Writer: AsyncWrite + Send + Unpin + 'static;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Returns the remote address, if the transport has one.
    fn peer_addr(&self) -> Option<SocketAddr>;

    /// Splits the connection into independently owned halves.
    fn into_split(self) -> (Self::Reader, Self::Writer);
}
