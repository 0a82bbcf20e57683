//! Configuration module for vless-relay
//!
//! This module provides configuration types and parsing for the server.

mod server;
mod transport;

pub use server::{Config, RelayConfig, ServerConfig};
pub use transport::TcpConfig;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config =
        toml::from_str(content).with_context(|| "Failed to parse configuration")?;
    validate_config(&config)?;
    Ok(config)
}

/// Check cross-field constraints that serde cannot express
pub fn validate_config(config: &Config) -> Result<()> {
    config
        .server
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid [server] section: {}", e))?;
    config
        .relay
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid [relay] section: {}", e))?;
    Ok(())
}
