//! WebSocketTransport - the session transport over tokio-tungstenite.
//!
//! One WebSocket per session connection. The stream is split so that a
//! pending `recv()` never blocks a `send()`.

use super::{Transport, TransportError};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Maximum outbound frame size (1MB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for WebSocketTransport.
///
/// The handshake timeout is applied by the connection manager.
#[derive(Clone, Debug)]
pub struct WebSocketConfig {
    /// Largest frame `send()` accepts.
    pub max_frame_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

/// WebSocketTransport implements the Transport trait using text frames.
///
/// # Example
///
/// ```ignore
/// let transport = WebSocketTransport::new();
/// transport.connect("ws://localhost:8080/coding/connect/?sessionId=abc").await?;
/// let init = transport.recv().await?;
/// ```
pub struct WebSocketTransport {
    /// Write half (if connected).
    writer: Mutex<Option<SplitSink<WsStream, Message>>>,
    /// Read half (if connected).
    reader: Mutex<Option<SplitStream<WsStream>>>,
    connected: AtomicBool,
    /// Configuration options.
    config: WebSocketConfig,
}

impl WebSocketTransport {
    /// Create a new, unconnected transport.
    pub fn new() -> Self {
        Self::with_config(WebSocketConfig::default())
    }

    /// Create a new transport with custom configuration.
    pub fn with_config(config: WebSocketConfig) -> Self {
        Self {
            writer: Mutex::new(None),
            reader: Mutex::new(None),
            connected: AtomicBool::new(false),
            config,
        }
    }

    fn mark_closed(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, url: &str) -> Result<(), TransportError> {
        // Close existing connection if any
        self.close().await.ok();

        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let (sink, source) = stream.split();
        *self.writer.lock().await = Some(sink);
        *self.reader.lock().await = Some(source);
        self.connected.store(true, Ordering::SeqCst);

        tracing::debug!(%url, "websocket open");
        Ok(())
    }

    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        if frame.len() > self.config.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: frame.len(),
                max: self.config.max_frame_size,
            });
        }

        let mut writer = self.writer.lock().await;
        let sink = writer.as_mut().ok_or(TransportError::NotConnected)?;

        if let Err(e) = sink.send(Message::Text(frame.into())).await {
            self.mark_closed();
            return Err(TransportError::SendFailed(e.to_string()));
        }
        Ok(())
    }

    async fn recv(&self) -> Result<String, TransportError> {
        let mut reader = self.reader.lock().await;
        let source = reader.as_mut().ok_or(TransportError::NotConnected)?;

        loop {
            match source.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Binary(bytes))) => {
                    return String::from_utf8(bytes.to_vec())
                        .map_err(|e| TransportError::ReceiveFailed(format!("binary frame: {e}")));
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(?frame, "websocket closed by peer");
                    self.mark_closed();
                    return Err(TransportError::ConnectionClosed);
                }
                // Control frames are answered by tungstenite itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.mark_closed();
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
                None => {
                    self.mark_closed();
                    return Err(TransportError::ConnectionClosed);
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.mark_closed();
        self.reader.lock().await.take();
        if let Some(mut sink) = self.writer.lock().await.take() {
            sink.close()
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        }
        Ok(())
    }
}
