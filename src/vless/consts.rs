//! VLESS protocol constants
//!
//! Field values and sizes used by the VLESS request header.

/// Length of the user UUID field
pub const VLESS_UUID_LEN: usize = 16;

/// Smallest first chunk that can hold a VLESS request header
pub const VLESS_MIN_HEADER_LEN: usize = 24;

/// Offset of the addon-length byte (after version and UUID)
pub const VLESS_ADDON_LEN_OFFSET: usize = 1 + VLESS_UUID_LEN;

// Commands
/// TCP stream
pub const VLESS_CMD_TCP: u8 = 0x01;
/// UDP datagrams
pub const VLESS_CMD_UDP: u8 = 0x02;
/// Multiplexed streams (not carried)
pub const VLESS_CMD_MUX: u8 = 0x03;

// Address types
/// IPv4 address
pub const VLESS_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const VLESS_ADDR_TYPE_DOMAIN: u8 = 0x02;
/// IPv6 address
pub const VLESS_ADDR_TYPE_IPV6: u8 = 0x03;

/// Status byte sent back in the response header
pub const VLESS_RESPONSE_OK: u8 = 0x00;
