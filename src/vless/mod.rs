//! VLESS protocol module
//!
//! Identity handling, request header parsing and the response header. The
//! relay core only sees this module through [`HandshakeValidator`].

mod consts;
mod header;
mod identity;

pub use consts::*;
pub use header::{parse_request, Command, ResponseHeader, VlessRequest};
pub use identity::Identity;

use crate::error::HandshakeError;

/// Validates the first chunk of a session
///
/// Implementations must be deterministic for the same inputs. The relay
/// calls [`validate`](HandshakeValidator::validate) exactly once per session.
pub trait HandshakeValidator: Send + Sync {
    /// Validate `first_chunk` against `identity`
    fn validate(
        &self,
        first_chunk: &[u8],
        identity: &Identity,
    ) -> Result<VlessRequest, HandshakeError>;
}

/// The stock VLESS header validator
#[derive(Debug, Clone, Copy, Default)]
pub struct VlessValidator;

impl HandshakeValidator for VlessValidator {
    fn validate(
        &self,
        first_chunk: &[u8],
        identity: &Identity,
    ) -> Result<VlessRequest, HandshakeError> {
        parse_request(first_chunk, identity)
    }
}
