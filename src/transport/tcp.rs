//! TCP connector implementation
//!
//! Dials plain TCP connections to the destination named in a handshake.

use super::{Connector, SocketOpts};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::helper::duration_from_secs;
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

/// TCP connector for outbound connections
#[derive(Debug, Clone)]
pub struct TcpConnector {
    /// Socket options to apply to connections
    socket_opts: SocketOpts,
    /// Connection timeout
    connect_timeout: Duration,
}

impl TcpConnector {
    /// Create a connector from relay configuration
    pub fn from_config(config: &RelayConfig) -> Self {
        TcpConnector {
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
            connect_timeout: duration_from_secs(config.connect_timeout),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16) -> Result<Self::Stream, RelayError> {
        let failure = |source: io::Error| RelayError::ConnectFailure {
            host: host.to_string(),
            port,
            source,
        };

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| failure(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")))?
            .map_err(failure)?;

        if let Err(e) = self.socket_opts.apply(&stream) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }

        tracing::debug!(
            "TCP connection established to {}",
            stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| format!("{}:{}", host, port))
        );

        Ok(stream)
    }
}
