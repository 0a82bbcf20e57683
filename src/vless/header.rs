//! VLESS request header parser
//!
//! Parses the request header found at the start of the first WebSocket
//! message of a session.

use super::consts::*;
use super::identity::Identity;
use crate::error::HandshakeError;
use bytes::Bytes;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Commands a VLESS client may request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Relay a TCP stream
    Tcp,
    /// Relay UDP datagrams (rejected by the relay)
    Udp,
}

impl Command {
    /// Parse a command byte
    ///
    /// MUX is not a command this crate understands, so it parses as `None`
    /// together with any unknown value.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            VLESS_CMD_TCP => Some(Command::Tcp),
            VLESS_CMD_UDP => Some(Command::Udp),
            _ => None,
        }
    }

    /// Convert the command to its wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            Command::Tcp => VLESS_CMD_TCP,
            Command::Udp => VLESS_CMD_UDP,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Tcp => write!(f, "TCP"),
            Command::Udp => write!(f, "UDP"),
        }
    }
}

/// A validated VLESS request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlessRequest {
    /// Protocol version byte, echoed back in the response
    pub version: u8,
    /// Requested command
    pub command: Command,
    /// Destination host: dotted IPv4, domain name, or colon-separated IPv6
    pub address: String,
    /// Destination port
    pub port: u16,
    /// Index in the first chunk where client payload begins
    pub payload_offset: usize,
}

impl VlessRequest {
    /// `address:port` label used in logs
    pub fn destination(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Response header sent to the client once the outbound connection is up
///
/// ```text
/// +---------+--------+
/// | VERSION | STATUS |
/// +---------+--------+
/// |    1    |  0x00  |
/// +---------+--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    version: u8,
}

impl ResponseHeader {
    /// Build the response for a request version
    pub fn new(version: u8) -> Self {
        ResponseHeader { version }
    }

    /// Wire form of the header
    pub fn to_bytes(self) -> Bytes {
        Bytes::copy_from_slice(&[self.version, VLESS_RESPONSE_OK])
    }
}

/// Parse the VLESS request header at the start of `chunk`
///
/// # VLESS Request Format
///
/// ```text
/// +-----+------+-----+-------+-----+------+------+---------+---------+
/// | VER | UUID | OPT |  OPTS | CMD | PORT | ATYP |  ADDR   | PAYLOAD |
/// +-----+------+-----+-------+-----+------+------+---------+---------+
/// |  1  |  16  |  1  |  OPT  |  1  |  2   |  1   | Variable|   ...   |
/// +-----+------+-----+-------+-----+------+------+---------+---------+
/// ```
///
/// Domain addresses carry a one-byte length prefix. The port is big-endian.
pub fn parse_request(chunk: &[u8], identity: &Identity) -> Result<VlessRequest, HandshakeError> {
    if chunk.len() < VLESS_MIN_HEADER_LEN {
        return Err(HandshakeError::TooShort);
    }

    let version = chunk[0];
    if !identity.matches(&chunk[1..=VLESS_UUID_LEN]) {
        return Err(HandshakeError::InvalidUser);
    }

    let addon_len = chunk[VLESS_ADDON_LEN_OFFSET] as usize;
    let cmd_index = VLESS_ADDON_LEN_OFFSET + 1 + addon_len;
    // CMD + PORT + ATYP
    let addr_index = cmd_index + 4;
    ensure_len(chunk, addr_index)?;

    let cmd_byte = chunk[cmd_index];
    let command =
        Command::from_byte(cmd_byte).ok_or(HandshakeError::UnknownCommand(cmd_byte))?;

    let port = u16::from_be_bytes([chunk[cmd_index + 1], chunk[cmd_index + 2]]);
    let addr_type = chunk[cmd_index + 3];

    let (address, payload_offset) = match addr_type {
        VLESS_ADDR_TYPE_IPV4 => {
            let end = addr_index + 4;
            ensure_len(chunk, end)?;
            let mut octets = [0u8; 4];
            octets.copy_from_slice(&chunk[addr_index..end]);
            (Ipv4Addr::from(octets).to_string(), end)
        }
        VLESS_ADDR_TYPE_DOMAIN => {
            ensure_len(chunk, addr_index + 1)?;
            let len = chunk[addr_index] as usize;
            let start = addr_index + 1;
            let end = start + len;
            ensure_len(chunk, end)?;
            let domain = std::str::from_utf8(&chunk[start..end])
                .map_err(|_| HandshakeError::InvalidDomain)?;
            (domain.to_string(), end)
        }
        VLESS_ADDR_TYPE_IPV6 => {
            let end = addr_index + 16;
            ensure_len(chunk, end)?;
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&chunk[addr_index..end]);
            (format_ipv6(Ipv6Addr::from(octets)), end)
        }
        other => return Err(HandshakeError::InvalidAddressType(other)),
    };

    if address.is_empty() {
        return Err(HandshakeError::EmptyAddress(addr_type));
    }

    tracing::trace!(
        "Parsed VLESS request: version={} command={} dest={}:{}",
        version,
        command,
        address,
        port
    );

    Ok(VlessRequest {
        version,
        command,
        address,
        port,
        payload_offset,
    })
}

fn ensure_len(chunk: &[u8], needed: usize) -> Result<(), HandshakeError> {
    if chunk.len() < needed {
        return Err(HandshakeError::Truncated {
            needed,
            got: chunk.len(),
        });
    }
    Ok(())
}

/// Eight uncompressed hex groups, the form dialers accept without brackets
fn format_ipv6(addr: Ipv6Addr) -> String {
    addr.segments()
        .iter()
        .map(|s| format!("{:x}", s))
        .collect::<Vec<_>>()
        .join(":")
}
