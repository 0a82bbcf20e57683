//! Outbound-to-client pipeline

use super::{BackpressureThrottle, ClientSink};
use crate::error::RelayError;
use crate::transport::OutboundReader;
use crate::vless::ResponseHeader;
use tokio::io::AsyncRead;
use tokio::sync::oneshot;
use tracing::debug;

/// Handed over by the handshake once the outbound connection is up
pub(super) struct Downstream<S> {
    pub(super) reader: OutboundReader<S>,
    pub(super) echo: ResponseHeader,
}

/// Relay outbound chunks to the client
///
/// Waits on `ready`, sends the response header, then forwards every chunk
/// through the throttle. Returns `Ok` when the outbound side reaches EOF.
/// `echo_sent` is set as soon as the header send is attempted.
pub(super) async fn run<S, K>(
    sink: &mut K,
    ready: oneshot::Receiver<Downstream<S>>,
    throttle: &mut BackpressureThrottle,
    bytes_sent: &mut u64,
    echo_sent: &mut bool,
) -> Result<(), RelayError>
where
    S: AsyncRead,
    K: ClientSink + ?Sized,
{
    let Downstream { mut reader, echo } = ready.await.map_err(|_| {
        RelayError::TransportClosedPrematurely("handshake did not complete".to_string())
    })?;

    if !sink.is_open() {
        return Err(RelayError::TransportClosedPrematurely(
            "client closed before the response header was sent".to_string(),
        ));
    }
    *echo_sent = true;
    sink.send(echo.to_bytes()).await?;

    loop {
        let chunk = match reader.next_chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                debug!("Outbound connection closed by remote");
                return Ok(());
            }
            Err(e) => {
                return Err(RelayError::TransportClosedPrematurely(format!(
                    "outbound read failed: {}",
                    e
                )));
            }
        };

        throttle.pace().await;

        if !sink.is_open() {
            return Err(RelayError::WriteAfterClose("client websocket"));
        }
        let len = chunk.len() as u64;
        sink.send(chunk).await?;
        *bytes_sent += len;
    }
}
