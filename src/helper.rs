//! Helper utilities for vless-relay
//!
//! This module provides common utility functions used throughout the application.

use std::time::Duration;
use uuid::Uuid;

/// Default buffer size for outbound reads
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Default connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Parse duration from seconds
pub fn duration_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

/// Short random identifier used to tell sessions apart in logs
pub fn session_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
