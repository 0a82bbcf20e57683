//! Client sink over a WebSocket

use crate::error::RelayError;
use crate::relay::ClientSink;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::SplitSink;
use futures::SinkExt;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::trace;

/// Upper bound on flushing the close frame to a stalled client
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Write half of a client WebSocket
pub struct WsSink<S> {
    inner: SplitSink<WebSocketStream<S>, Message>,
    open: Arc<AtomicBool>,
    closed: bool,
}

impl<S> WsSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a split sink; `open` is shared with the read side
    pub fn new(inner: SplitSink<WebSocketStream<S>, Message>, open: Arc<AtomicBool>) -> Self {
        WsSink {
            inner,
            open,
            closed: false,
        }
    }
}

#[async_trait]
impl<S> ClientSink for WsSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn is_open(&self) -> bool {
        !self.closed && self.open.load(Ordering::SeqCst)
    }

    async fn send(&mut self, data: Bytes) -> Result<(), RelayError> {
        if !self.is_open() {
            return Err(RelayError::WriteAfterClose("client websocket"));
        }
        if let Err(e) = self.inner.send(Message::Binary(data.to_vec())).await {
            self.open.store(false, Ordering::SeqCst);
            return Err(RelayError::TransportClosedPrematurely(format!(
                "websocket send failed: {}",
                e
            )));
        }
        Ok(())
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let was_open = self.open.swap(false, Ordering::SeqCst);
        let close = async {
            if was_open {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: Cow::Borrowed(""),
                };
                self.inner.send(Message::Close(Some(frame))).await?;
            }
            self.inner.close().await
        };
        match tokio::time::timeout(CLOSE_TIMEOUT, close).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => trace!("WebSocket close error ignored: {}", e),
            Err(_) => trace!("WebSocket close timed out"),
        }
    }
}
