//! Inbound byte source

use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, warn};

/// Adapt a WebSocket message stream into ordered binary chunks
///
/// The stream ends on a close frame, a read error or EOF; each of these
/// also clears `open`. Text frames are dropped with a warning, control
/// frames are handled by tungstenite and skipped here.
pub fn inbound_chunks<St>(
    messages: St,
    early_data: Option<Bytes>,
    open: Arc<AtomicBool>,
) -> BoxStream<'static, Bytes>
where
    St: Stream<Item = Result<Message, WsError>> + Unpin + Send + 'static,
{
    let chunks = stream::unfold((messages, open), |(mut messages, open)| async move {
        loop {
            match messages.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Some((Bytes::from(data), (messages, open)));
                }
                Some(Ok(Message::Text(text))) => {
                    warn!("Dropping {}-byte text message from client", text.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("Client closed the WebSocket: {:?}", frame);
                    open.store(false, Ordering::SeqCst);
                    return None;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Client WebSocket aborted: {}", e);
                    open.store(false, Ordering::SeqCst);
                    return None;
                }
                None => {
                    open.store(false, Ordering::SeqCst);
                    return None;
                }
            }
        }
    });

    stream::iter(early_data.filter(|data| !data.is_empty()))
        .chain(chunks)
        .boxed()
}
