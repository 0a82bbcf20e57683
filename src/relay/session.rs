//! Session orchestration
//!
//! A session moves through `AwaitingHandshake -> Connecting -> Relaying ->
//! Closed`. The first inbound chunk is validated exactly once; after the
//! outbound connection is up, every later chunk is forwarded untouched.

use super::downlink::{self, Downstream};
use super::{BackpressureThrottle, ClientSink, SessionReport};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::helper::session_id;
use crate::transport::{split_outbound, Connector, OutboundWriter};
use crate::vless::{Command, HandshakeValidator, Identity, ResponseHeader, VlessValidator};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt;
use tokio::sync::oneshot;
use tracing::{debug, field, info, info_span, warn, Instrument, Span};

/// Serves relay sessions for one identity
///
/// Shared between connection tasks (wrap it in an `Arc`).
pub struct Relay<C, V = VlessValidator> {
    identity: Identity,
    connector: C,
    validator: V,
    config: RelayConfig,
}

impl<C: Connector> Relay<C, VlessValidator> {
    /// Create a relay using the stock VLESS validator
    pub fn new(identity: Identity, connector: C, config: RelayConfig) -> Self {
        Self::with_validator(identity, connector, VlessValidator, config)
    }
}

impl<C, V> Relay<C, V>
where
    C: Connector,
    V: HandshakeValidator,
{
    /// Create a relay with a custom handshake validator
    pub fn with_validator(
        identity: Identity,
        connector: C,
        validator: V,
        config: RelayConfig,
    ) -> Self {
        Relay {
            identity,
            connector,
            validator,
            config,
        }
    }

    /// Run one session to completion
    ///
    /// `inbound` yields the client's binary messages in arrival order and
    /// ends when the client goes away. Returns after both the outbound
    /// connection and `sink` have been closed.
    pub async fn serve<I, K>(
        &self,
        inbound: I,
        mut sink: K,
    ) -> Result<SessionReport, RelayError>
    where
        I: Stream<Item = Bytes> + Unpin + Send,
        K: ClientSink,
    {
        let span = info_span!("session", session = %session_id(), dest = field::Empty);
        self.run_session(inbound, &mut sink).instrument(span).await
    }

    async fn run_session<I, K>(
        &self,
        mut inbound: I,
        sink: &mut K,
    ) -> Result<SessionReport, RelayError>
    where
        I: Stream<Item = Bytes> + Unpin + Send,
        K: ClientSink,
    {
        let (ready_tx, ready_rx) = oneshot::channel();
        let mut uplink = Uplink::new(self, ready_tx);
        let mut throttle = if self.config.throttle {
            BackpressureThrottle::new()
        } else {
            BackpressureThrottle::disabled()
        };
        let mut downlink_bytes = 0u64;
        let mut echo_sent = false;

        // Inbound goes first so a handshake error wins over the gate drop
        let outcome = tokio::select! {
            biased;
            result = uplink.run(&mut inbound) => result,
            result = downlink::run(
                &mut *sink,
                ready_rx,
                &mut throttle,
                &mut downlink_bytes,
                &mut echo_sent,
            ) => result,
        };

        uplink.close().await;

        // The uplink can finish in the same poll that opened the gate
        if let Some(echo) = uplink.echo {
            if !echo_sent && sink.is_open() {
                if let Err(e) = sink.send(echo.to_bytes()).await {
                    debug!("Response header not delivered: {}", e);
                }
            }
        }
        sink.close().await;

        let report = SessionReport {
            destination: uplink.destination.take(),
            uplink_bytes: uplink.bytes_written,
            downlink_bytes,
            downlink_chunks: throttle.chunks(),
        };

        match outcome {
            Ok(()) => {
                info!(
                    "Session closed: {} bytes up, {} bytes down in {} chunks",
                    report.uplink_bytes, report.downlink_bytes, report.downlink_chunks
                );
                Ok(report)
            }
            Err(e) => {
                if e.is_teardown() {
                    debug!("Session closed: {}", e);
                } else {
                    warn!("Session failed: {}", e);
                }
                Err(e)
            }
        }
    }
}

enum State<S> {
    AwaitingHandshake(oneshot::Sender<Downstream<S>>),
    Connecting,
    Relaying(OutboundWriter<S>),
    Closed,
}

impl<S> fmt::Display for State<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::AwaitingHandshake(_) => write!(f, "awaiting handshake"),
            State::Connecting => write!(f, "connecting"),
            State::Relaying(_) => write!(f, "relaying"),
            State::Closed => write!(f, "closed"),
        }
    }
}

/// Client-to-outbound pipeline and the session state it owns
struct Uplink<'a, C: Connector, V> {
    relay: &'a Relay<C, V>,
    state: State<C::Stream>,
    destination: Option<String>,
    /// Set once the gate has been opened
    echo: Option<ResponseHeader>,
    bytes_written: u64,
}

impl<'a, C, V> Uplink<'a, C, V>
where
    C: Connector,
    V: HandshakeValidator,
{
    fn new(relay: &'a Relay<C, V>, ready: oneshot::Sender<Downstream<C::Stream>>) -> Self {
        Uplink {
            relay,
            state: State::AwaitingHandshake(ready),
            destination: None,
            echo: None,
            bytes_written: 0,
        }
    }

    async fn run<I>(&mut self, inbound: &mut I) -> Result<(), RelayError>
    where
        I: Stream<Item = Bytes> + Unpin,
    {
        while let Some(chunk) = inbound.next().await {
            self.on_chunk(chunk).await?;
        }
        debug!("Client stream ended while {}", self.state);
        Ok(())
    }

    async fn on_chunk(&mut self, chunk: Bytes) -> Result<(), RelayError> {
        match self.state {
            State::Relaying(ref mut writer) => {
                let n = writer.write(&chunk).await?;
                self.bytes_written += n as u64;
                Ok(())
            }
            State::AwaitingHandshake(_) => self.handshake(chunk).await,
            State::Connecting | State::Closed => {
                Err(RelayError::WriteAfterClose("session is not relaying"))
            }
        }
    }

    async fn handshake(&mut self, chunk: Bytes) -> Result<(), RelayError> {
        let ready = match std::mem::replace(&mut self.state, State::Connecting) {
            State::AwaitingHandshake(ready) => ready,
            other => {
                self.state = other;
                return Err(RelayError::WriteAfterClose("handshake already processed"));
            }
        };

        match self.establish(chunk, ready).await {
            Ok(writer) => {
                self.state = State::Relaying(writer);
                debug!("Handshake complete, {}", self.state);
                Ok(())
            }
            Err(e) => {
                self.state = State::Closed;
                Err(e)
            }
        }
    }

    /// Validate, connect, forward the leftover payload and open the gate
    async fn establish(
        &mut self,
        chunk: Bytes,
        ready: oneshot::Sender<Downstream<C::Stream>>,
    ) -> Result<OutboundWriter<C::Stream>, RelayError> {
        let relay = self.relay;
        let request = relay.validator.validate(&chunk, &relay.identity)?;

        let destination = request.destination();
        Span::current().record("dest", destination.as_str());
        self.destination = Some(destination);

        if request.command == Command::Udp {
            return Err(RelayError::UnsupportedCommand(request.command));
        }
        if request.payload_offset > chunk.len() {
            return Err(RelayError::HandshakeRejected(format!(
                "payload offset {} beyond chunk of {} bytes",
                request.payload_offset,
                chunk.len()
            )));
        }

        info!("Connecting");
        let stream = relay.connector.connect(&request.address, request.port).await?;
        let (reader, mut writer) = split_outbound(stream, relay.config.read_buffer_size);

        let payload = chunk.slice(request.payload_offset..);
        if !payload.is_empty() {
            let n = writer.write(&payload).await?;
            self.bytes_written += n as u64;
        }

        let echo = ResponseHeader::new(request.version);
        ready
            .send(Downstream { reader, echo })
            .map_err(|_| {
                RelayError::TransportClosedPrematurely("client pipeline already ended".to_string())
            })?;
        self.echo = Some(echo);

        Ok(writer)
    }

    /// Enter `Closed`, shutting down the outbound writer if there is one
    async fn close(&mut self) {
        if let State::Relaying(mut writer) = std::mem::replace(&mut self.state, State::Closed) {
            writer.close().await;
        }
    }
}
