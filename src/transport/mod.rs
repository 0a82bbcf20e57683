//! Outbound transport module
//!
//! This module provides the outbound side of a relay session: the
//! [`Connector`] abstraction that dials the destination, its TCP
//! implementation, and the split reader/writer halves the relay drives.

mod stream;
mod tcp;

pub use stream::{split_outbound, OutboundReader, OutboundWriter};
pub use tcp::TcpConnector;

use crate::config::TcpConfig;
use crate::error::RelayError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Socket options for configuring connections
#[derive(Debug, Clone)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl SocketOpts {
    /// Create socket options from TCP config
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: Some(config.keepalive_secs),
            keepalive_interval: Some(config.keepalive_interval),
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let (Some(timeout), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(timeout))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}

/// Dials the destination requested by a client
///
/// The relay calls [`connect`](Connector::connect) at most once per session,
/// after the handshake has been validated. Implementations must not retry on
/// their own.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The byte stream produced by a successful dial
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a connection to `host:port`
    ///
    /// Failures are reported as [`RelayError::ConnectFailure`].
    async fn connect(&self, host: &str, port: u16) -> Result<Self::Stream, RelayError>;
}
