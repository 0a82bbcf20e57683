//! Server and relay configuration types
//!
//! Defines the main configuration structures for the relay.

use super::TcpConfig;
use crate::helper::{DEFAULT_BUFFER_SIZE, DEFAULT_CONNECT_TIMEOUT_SECS};
use crate::vless::Identity;
use serde::{Deserialize, Serialize};

/// Default listen address
fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_true() -> bool {
    true
}

/// Default outbound connect timeout in seconds
fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_read_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Relay session configuration
    #[serde(default)]
    pub relay: RelayConfig,
}

/// WebSocket listener configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// User UUID clients must present
    #[serde(default)]
    pub uuid: Option<String>,

    /// Only accept upgrades on this path
    #[serde(default)]
    pub path: Option<String>,

    /// Accept early data in the Sec-WebSocket-Protocol header
    #[serde(default = "default_true")]
    pub early_data: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: default_listen_addr(),
            uuid: None,
            path: None,
            early_data: true,
        }
    }
}

impl ServerConfig {
    /// Parse the configured UUID
    ///
    /// Returns `None` when it is missing or malformed; the server then
    /// refuses every upgrade.
    pub fn identity(&self) -> Option<Identity> {
        self.uuid.as_deref().and_then(|s| s.parse().ok())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if let Some(path) = &self.path {
            if !path.starts_with('/') {
                return Err(format!("path must start with '/': {}", path));
            }
        }
        Ok(())
    }
}

/// Per-session relay configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Delay WebSocket sends based on the downlink chunk count
    #[serde(default = "default_true")]
    pub throttle: bool,

    /// Maximum size of one chunk read from the outbound connection
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// Outbound connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Outbound TCP socket options
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            throttle: true,
            read_buffer_size: default_read_buffer_size(),
            connect_timeout: default_connect_timeout(),
            tcp: TcpConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.read_buffer_size == 0 {
            return Err("read_buffer_size must be greater than zero".to_string());
        }
        if self.connect_timeout == 0 {
            return Err("connect_timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}
