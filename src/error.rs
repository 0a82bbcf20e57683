//! Error types for vless-relay
//!
//! This module defines the error types produced by the relay core and the
//! VLESS handshake parser.

use crate::vless::Command;
use std::io;
use thiserror::Error;

/// Errors that terminate a relay session
///
/// Every variant is local to one session; none of them stops the server.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The handshake failed validation (bad identity or malformed header)
    #[error("Handshake rejected: {0}")]
    HandshakeRejected(String),

    /// The client asked for a command this relay does not carry
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(Command),

    /// Dialing the destination failed
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailure {
        /// Destination host as sent by the client
        host: String,
        /// Destination port
        port: u16,
        /// Underlying dial error
        #[source]
        source: io::Error,
    },

    /// One side went away before the relay finished
    #[error("Transport closed prematurely: {0}")]
    TransportClosedPrematurely(String),

    /// A write was attempted on a transport that is already closed
    #[error("Write after close: {0}")]
    WriteAfterClose(&'static str),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<HandshakeError> for RelayError {
    fn from(err: HandshakeError) -> Self {
        RelayError::HandshakeRejected(err.to_string())
    }
}

/// VLESS header validation failures
///
/// The `Display` text is what ends up in [`RelayError::HandshakeRejected`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// First chunk is too short to hold a VLESS header
    #[error("invalid data")]
    TooShort,

    /// UUID in the header does not match the configured identity
    #[error("invalid user")]
    InvalidUser,

    /// Command byte is not one of TCP/UDP/MUX
    #[error("command {0} is not supported, command 01-tcp,02-udp,03-mux")]
    UnknownCommand(u8),

    /// Address type byte is not one of IPv4/domain/IPv6
    #[error("invalid address type {0}")]
    InvalidAddressType(u8),

    /// Address field decoded to an empty string
    #[error("address value is empty, address type is {0}")]
    EmptyAddress(u8),

    /// Header claims more bytes than the chunk holds
    #[error("header truncated: need {needed} bytes, got {got}")]
    Truncated {
        /// Bytes required by the header fields
        needed: usize,
        /// Bytes actually present
        got: usize,
    },

    /// Domain address is not valid UTF-8
    #[error("domain is not valid UTF-8")]
    InvalidDomain,
}

impl RelayError {
    /// Whether this error is part of a normal teardown rather than a fault
    ///
    /// Hosts log these at `debug` instead of `warn`.
    pub fn is_teardown(&self) -> bool {
        matches!(
            self,
            RelayError::TransportClosedPrematurely(_) | RelayError::WriteAfterClose(_)
        )
    }
}
