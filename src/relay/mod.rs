//! Relay core
//!
//! One [`Relay`] serves any number of sessions. Each call to
//! [`Relay::serve`] drives a single WebSocket session from the first inbound
//! chunk to full teardown:
//!
//! ```text
//! inbound chunks -> handshake -> connect -> outbound writer
//! outbound reader -> throttle -> client sink
//! ```

mod downlink;
mod session;
mod throttle;

pub use session::Relay;
pub use throttle::BackpressureThrottle;

use crate::error::RelayError;
use async_trait::async_trait;
use bytes::Bytes;

/// Write side of the client connection
///
/// Only the outbound-to-client pipeline sends; the session closes the sink
/// once, during teardown.
#[async_trait]
pub trait ClientSink: Send {
    /// Whether the client connection can still accept data
    fn is_open(&self) -> bool;

    /// Send one binary message
    ///
    /// Fails with [`RelayError::WriteAfterClose`] if the sink is no longer
    /// open. Implementations must not retry.
    async fn send(&mut self, data: Bytes) -> Result<(), RelayError>;

    /// Close the connection; closing a closed sink is a no-op
    async fn close(&mut self);
}

/// Summary of a finished session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// `address:port` from the handshake, if one was accepted
    pub destination: Option<String>,
    /// Payload bytes written to the outbound connection
    pub uplink_bytes: u64,
    /// Payload bytes sent to the client, excluding the response header
    pub downlink_bytes: u64,
    /// Chunks read from the outbound connection
    pub downlink_chunks: u64,
}
