//! User identity
//!
//! A VLESS user is identified by a UUID. The configured string is validated
//! once at startup and then compared byte-wise against every handshake.

use crate::error::RelayError;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The access identifier a client must present in its handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(Uuid);

impl Identity {
    /// Create an identity from a UUID
    pub fn new(uuid: Uuid) -> Self {
        Identity(uuid)
    }

    /// Generate a random identity
    pub fn random() -> Self {
        Identity(Uuid::new_v4())
    }

    /// Raw 16-byte form, as carried on the wire
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Check whether a raw UUID field matches this identity
    pub fn matches(&self, raw: &[u8]) -> bool {
        raw == self.as_bytes()
    }
}

impl FromStr for Identity {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Identity)
            .map_err(|e| RelayError::Config(format!("invalid UUID {:?}: {}", s, e)))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}
