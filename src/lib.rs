//! # vless-relay - VLESS over WebSocket relay
//!
//! vless-relay accepts WebSocket connections, authenticates the first message
//! as a VLESS request header and relays the rest of the session to the
//! requested TCP destination.
//!
//! ## Features
//!
//! - **Single-shot handshake**: the request header is validated exactly once
//!   per session, and the outbound connection is opened at most once
//! - **Ordered relaying**: the response header always precedes relayed data
//! - **Backpressure throttle**: tiered pacing of outbound-to-client traffic
//! - **Early data**: the first payload may ride in `Sec-WebSocket-Protocol`
//! - **Clean teardown**: both sides are closed exactly once, whichever ends first
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vless_relay::config::load_config;
//! use vless_relay::server::run_server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_server(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! WebSocket client -> vless-relay -> TCP destination
//! ```
//!
//! The relay core in [`relay`] is independent of WebSocket and TCP; it sees
//! the client through [`relay::ClientSink`] and a chunk stream, the
//! destination through [`transport::Connector`], and the header format
//! through [`vless::HandshakeValidator`].

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod helper;
pub mod relay;
pub mod server;
pub mod transport;
pub mod vless;
pub mod websocket;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{HandshakeError, RelayError};
pub use relay::{ClientSink, Relay, SessionReport};
pub use server::run_server;
pub use vless::Identity;

/// Version of the vless-relay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
