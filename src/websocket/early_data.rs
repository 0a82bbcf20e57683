//! WebSocket early data
//!
//! Clients may put the first chunk of a session in the
//! `Sec-WebSocket-Protocol` header, base64url encoded, to save a round trip.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::{DecodeError, Engine};
use bytes::Bytes;

/// Decode an early-data header value
///
/// Accepts both the URL-safe and the standard alphabet, with or without
/// padding. An empty value means no early data.
pub fn decode_early_data(value: &str) -> Result<Option<Bytes>, DecodeError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let normalized: String = value
        .chars()
        .filter(|c| *c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let data = URL_SAFE_NO_PAD.decode(normalized)?;
    Ok(Some(Bytes::from(data)))
}
