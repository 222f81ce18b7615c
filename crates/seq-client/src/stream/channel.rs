//! The WebSocket streaming channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use futures_util::{SinkExt, Stream, StreamExt};
use parking_lot::Mutex;
use reqwest::cookie::Jar;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::handshake;
use crate::error::{Error, Result};

/// Stop state shared between a stream, its handles and the read task.
struct StreamShared {
    closed: AtomicBool,
    stop: Mutex<Option<oneshot::Sender<()>>>,
}

impl StreamShared {
    fn stop(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(sender) = self.stop.lock().take() {
            let _ = sender.send(());
        }
    }

    fn is_stopped(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// A live sequence of decoded messages from a WebSocket stream.
///
/// Messages arrive in the order the server sent them. The sequence ends
/// with `None` after a clean server close, yields a final `Err` item after
/// an abnormal one, and yields nothing further once [`stop`](Self::stop)
/// has been called, buffered messages included. Dropping the stream closes
/// the connection.
pub struct MessageStream<T> {
    rx: mpsc::UnboundedReceiver<Result<T>>,
    shared: Arc<StreamShared>,
    url: Url,
}

impl<T> MessageStream<T> {
    /// The next message, or `None` once the stream has terminated.
    pub async fn next(&mut self) -> Option<Result<T>> {
        std::future::poll_fn(|cx| self.poll_receive(cx)).await
    }

    /// Stop the stream and close the connection.
    pub fn stop(&mut self) {
        self.shared.stop();
    }

    /// Whether the stream has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// A cloneable handle that can stop this stream from another task.
    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            shared: self.shared.clone(),
        }
    }

    /// The resolved URL the stream was opened from, before the scheme
    /// swap to `ws`/`wss`.
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn poll_receive(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<T>>> {
        if self.shared.is_stopped() {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl<T> Stream for MessageStream<T> {
    type Item = Result<T>;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_receive(cx)
    }
}

impl<T> Drop for MessageStream<T> {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

impl<T> std::fmt::Debug for MessageStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("url", &self.url.as_str())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// A cloneable handle for stopping a [`MessageStream`].
#[derive(Clone)]
pub struct StreamHandle {
    shared: Arc<StreamShared>,
}

impl StreamHandle {
    /// Stop the stream and close the connection.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Whether the stream has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Connect a stream URL and spawn its read task.
pub(crate) async fn connect<T, D>(
    url: Url,
    api_key: Option<&str>,
    cookies: &Jar,
    decode: D,
) -> Result<MessageStream<T>>
where
    T: Send + 'static,
    D: Fn(&str) -> Result<T> + Send + 'static,
{
    let request = handshake::build_request(&url, api_key, cookies)?;
    let (socket, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocket(e.to_string()))?;

    tracing::debug!(target: "seq_client::stream", "stream connected: {}", url);

    let (tx, rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel();
    let shared = Arc::new(StreamShared {
        closed: AtomicBool::new(false),
        stop: Mutex::new(Some(stop_tx)),
    });

    tokio::spawn(read_task(socket, stop_rx, tx, decode));

    Ok(MessageStream { rx, shared, url })
}

/// Pump the socket into the channel until the stream ends.
///
/// Text frames are decoded and forwarded in arrival order; a decode
/// failure is forwarded and then terminates the stream. A close frame
/// with a code other than `Normal` surfaces as a final error item.
async fn read_task<T, D>(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut stop_rx: oneshot::Receiver<()>,
    tx: mpsc::UnboundedSender<Result<T>>,
    decode: D,
) where
    T: Send + 'static,
    D: Fn(&str) -> Result<T> + Send + 'static,
{
    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                break;
            }
            message = read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        let decoded = decode(&text);
                        let terminal = decoded.is_err();
                        if tx.send(decoded).is_err() || terminal {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(frame) = frame
                            && frame.code != CloseCode::Normal
                        {
                            let _ = tx.send(Err(Error::WebSocket(format!(
                                "connection closed abnormally: {} {}",
                                u16::from(frame.code),
                                frame.reason,
                            ))));
                        }
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping, pong and binary frames carry no messages.
                    }
                    Some(Err(e)) => {
                        let _ = tx.send(Err(Error::WebSocket(e.to_string())));
                        break;
                    }
                    None => {
                        break;
                    }
                }
            }
        }
    }

    let _ = write.close().await;
    tracing::debug!(target: "seq_client::stream", "stream closed");
}
