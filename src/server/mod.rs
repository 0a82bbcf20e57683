//! WebSocket listener
//!
//! Accepts TCP connections, performs the WebSocket upgrade and hands each
//! upgraded socket to the [`Relay`] in its own task.

use crate::config::{Config, ServerConfig};
use crate::relay::Relay;
use crate::transport::TcpConnector;
use crate::websocket::{decode_early_data, split_socket};
use anyhow::{Context, Result};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{debug, error, info, warn};

/// Accepts WebSocket upgrades and runs a relay session per connection
pub struct Server {
    /// `None` when no valid UUID is configured; every upgrade is refused
    relay: Option<Relay<TcpConnector>>,
    path: Option<String>,
    early_data: bool,
}

impl Server {
    /// Build a server from configuration
    pub fn new(config: &Config) -> Self {
        let relay = match config.server.identity() {
            Some(identity) => Some(Relay::new(
                identity,
                TcpConnector::from_config(&config.relay),
                config.relay.clone(),
            )),
            None => {
                warn!("No valid UUID configured, all connections will be refused");
                None
            }
        };

        Server {
            relay,
            path: config.server.path.clone(),
            early_data: config.server.early_data,
        }
    }

    /// Whether connections can be served at all
    pub fn is_authorized(&self) -> bool {
        self.relay.is_some()
    }

    /// Handle one accepted TCP connection until its session ends
    pub async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let mut early_data: Option<Bytes> = None;

        let callback = |request: &Request, response: Response| {
            self.check_upgrade(request, response, &mut early_data)
        };

        let ws = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
            Ok(ws) => ws,
            Err(e) => {
                debug!("WebSocket upgrade from {} failed: {}", peer, e);
                return;
            }
        };

        let Some(relay) = &self.relay else {
            return;
        };

        debug!("Accepted WebSocket from {}", peer);
        let (inbound, sink) = split_socket(ws, early_data);
        if let Err(e) = relay.serve(inbound, sink).await {
            debug!("Session from {} ended: {}", peer, e);
        }
    }

    /// Validate an upgrade request and capture its early data
    fn check_upgrade(
        &self,
        request: &Request,
        mut response: Response,
        early_data: &mut Option<Bytes>,
    ) -> Result<Response, ErrorResponse> {
        if self.relay.is_none() {
            return Err(error_response(StatusCode::UNAUTHORIZED, "Unauthorized"));
        }

        if let Some(path) = &self.path {
            if request.uri().path() != path {
                return Err(error_response(StatusCode::NOT_FOUND, "Not Found"));
            }
        }

        if self.early_data {
            if let Some(value) = request.headers().get(SEC_WEBSOCKET_PROTOCOL) {
                let decoded = value
                    .to_str()
                    .ok()
                    .and_then(|s| decode_early_data(s).ok())
                    .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Bad early data"))?;
                *early_data = decoded;
                response
                    .headers_mut()
                    .insert(SEC_WEBSOCKET_PROTOCOL, value.clone());
            }
        }

        Ok(response)
    }
}

fn error_response(status: StatusCode, body: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(body.to_string()));
    *response.status_mut() = status;
    response
}

/// Bind the configured address and serve until shutdown
pub async fn run_server(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;

    serve_listener(listener, config, shutdown_rx).await
}

/// Serve connections from an already bound listener until shutdown
pub async fn serve_listener(
    listener: TcpListener,
    config: Config,
    mut shutdown_rx: broadcast::Receiver<bool>,
) -> Result<()> {
    let server = Arc::new(Server::new(&config));
    info!("Listening on {}", listener.local_addr()?);
    log_server_config(&config.server);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let server = server.clone();
                        tokio::spawn(async move {
                            server.handle_connection(stream, peer).await;
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping server");
                break;
            }
        }
    }

    info!("Server stopped");
    Ok(())
}

fn log_server_config(config: &ServerConfig) {
    if let Some(path) = &config.path {
        info!("Accepting upgrades on path {}", path);
    }
    debug!("Early data: {}", if config.early_data { "on" } else { "off" });
}
