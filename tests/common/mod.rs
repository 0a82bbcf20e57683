//! Test utilities for vless-relay
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use vless_relay::config::{Config, RelayConfig, ServerConfig};
use vless_relay::server::serve_listener;
use vless_relay::vless::{VLESS_CMD_TCP, VLESS_CMD_UDP};

/// UUID shared by the relay and the test clients
pub const TEST_UUID: &str = "d342d11e-d424-4583-b36e-524ab1f0afa4";

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Start a relay server in the background
///
/// Returns its address and the sender that stops it.
pub async fn start_relay(config: Config) -> (SocketAddr, broadcast::Sender<bool>) {
    let (listener, addr) = create_test_listener().await;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        serve_listener(listener, config, shutdown_rx).await.unwrap();
    });

    (addr, shutdown_tx)
}

/// Start a TCP server that echoes everything back
pub async fn start_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });

    addr
}

/// Start a TCP server that reads one request, answers it and closes
pub async fn start_oneshot_server(reply: &'static [u8]) -> SocketAddr {
    let (listener, addr) = create_test_listener().await;

    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(reply).await;
            let _ = stream.shutdown().await;
        }
    });

    addr
}

/// Connect to a TCP address, for checking servers are reachable
pub async fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr).await.unwrap()
}

/// VLESS request header builders
pub mod vless_mock {
    use super::*;
    use vless_relay::vless::{VLESS_ADDR_TYPE_DOMAIN, VLESS_ADDR_TYPE_IPV4};

    fn uuid_bytes(uuid: &str) -> [u8; 16] {
        *uuid::Uuid::parse_str(uuid).unwrap().as_bytes()
    }

    fn header(uuid: &str, command: u8, port: u16) -> Vec<u8> {
        let mut req = vec![0u8];
        req.extend_from_slice(&uuid_bytes(uuid));
        req.push(0);
        req.push(command);
        req.extend_from_slice(&port.to_be_bytes());
        req
    }

    /// TCP request to an IPv4 destination followed by `payload`
    pub fn tcp_ipv4(uuid: &str, addr: SocketAddr, payload: &[u8]) -> Vec<u8> {
        let ip = match addr {
            SocketAddr::V4(v4) => v4.ip().octets(),
            SocketAddr::V6(_) => panic!("IPv4 address expected"),
        };
        let mut req = header(uuid, VLESS_CMD_TCP, addr.port());
        req.push(VLESS_ADDR_TYPE_IPV4);
        req.extend_from_slice(&ip);
        req.extend_from_slice(payload);
        req
    }

    /// TCP request to a domain destination followed by `payload`
    pub fn tcp_domain(uuid: &str, domain: &str, port: u16, payload: &[u8]) -> Vec<u8> {
        let mut req = header(uuid, VLESS_CMD_TCP, port);
        req.push(VLESS_ADDR_TYPE_DOMAIN);
        req.push(domain.len() as u8);
        req.extend_from_slice(domain.as_bytes());
        req.extend_from_slice(payload);
        req
    }

    /// UDP request to an IPv4 destination
    pub fn udp_ipv4(uuid: &str, addr: SocketAddr) -> Vec<u8> {
        let mut req = tcp_ipv4(uuid, addr, &[]);
        req[18] = VLESS_CMD_UDP;
        req
    }
}

/// Test configuration builder
pub struct TestConfigBuilder {
    uuid: Option<String>,
    path: Option<String>,
    early_data: bool,
    throttle: bool,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        TestConfigBuilder {
            uuid: Some(TEST_UUID.to_string()),
            path: None,
            early_data: true,
            throttle: false,
        }
    }
}

impl TestConfigBuilder {
    /// Create a new test config builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the UUID
    pub fn uuid(mut self, uuid: Option<&str>) -> Self {
        self.uuid = uuid.map(str::to_string);
        self
    }

    /// Restrict upgrades to a path
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    /// Set early data support
    pub fn early_data(mut self, enabled: bool) -> Self {
        self.early_data = enabled;
        self
    }

    /// Set throttling
    pub fn throttle(mut self, enabled: bool) -> Self {
        self.throttle = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        Config {
            server: ServerConfig {
                listen_addr: "127.0.0.1:0".to_string(),
                uuid: self.uuid,
                path: self.path,
                early_data: self.early_data,
            },
            relay: RelayConfig {
                throttle: self.throttle,
                ..RelayConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_listener() {
        let (listener, addr) = create_test_listener().await;
        assert!(addr.port() > 0);
        drop(listener);
    }

    #[tokio::test]
    async fn test_echo_server() {
        let addr = start_echo_server().await;
        let mut stream = connect(addr).await;

        stream.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_request_layout() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let req = vless_mock::tcp_ipv4(TEST_UUID, addr, b"GET");

        assert_eq!(req.len(), 26 + 3);
        assert_eq!(req[18], VLESS_CMD_TCP);
        assert_eq!(&req[19..21], &8080u16.to_be_bytes());
        assert_eq!(&req[22..26], &[127, 0, 0, 1]);
        assert_eq!(&req[26..], b"GET");

        assert_eq!(vless_mock::udp_ipv4(TEST_UUID, addr)[18], VLESS_CMD_UDP);
    }

    #[test]
    fn test_config_builder() {
        let config = TestConfigBuilder::new()
            .uuid(None)
            .path("/ws")
            .early_data(false)
            .throttle(true)
            .build();

        assert!(config.server.uuid.is_none());
        assert_eq!(config.server.path.as_deref(), Some("/ws"));
        assert!(!config.server.early_data);
        assert!(config.relay.throttle);
    }
}
