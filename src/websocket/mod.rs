//! WebSocket adapters
//!
//! Turns an accepted `tokio-tungstenite` WebSocket into the two halves the
//! relay core consumes: an ordered stream of binary chunks and a
//! [`ClientSink`](crate::relay::ClientSink).

mod early_data;
mod inbound;
mod sink;

pub use early_data::decode_early_data;
pub use inbound::inbound_chunks;
pub use sink::WsSink;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;

/// Split an accepted WebSocket into the relay's inbound source and sink
///
/// `early_data`, if any, is yielded before the first WebSocket message. The
/// two halves share the socket's open state, so a close seen on the read
/// side fails later sends immediately.
pub fn split_socket<S>(
    ws: WebSocketStream<S>,
    early_data: Option<Bytes>,
) -> (BoxStream<'static, Bytes>, WsSink<S>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let open = Arc::new(AtomicBool::new(true));
    let (sink, stream) = ws.split();
    (
        inbound_chunks(stream, early_data, open.clone()),
        WsSink::new(sink, open),
    )
}
