//! Mock transport for testing.
//!
//! Allows queueing inbound frames, simulating a remote close, and capturing
//! sent frames for verification.

use super::{Transport, TransportError};
use async_trait::async_trait;
use livepad_types::ClientMessage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Mock transport for testing.
///
/// Clones share state, so a test can keep one handle while the client owns
/// another.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
    wake: Arc<Notify>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    remote_closed: bool,
    connect_history: Vec<String>,
    sent_frames: Vec<String>,
    receive_queue: VecDeque<String>,
    fail_next_connect: Option<String>,
    fail_next_send: Option<String>,
    fail_next_recv: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a frame to be returned by a `recv()` call.
    pub fn queue_response(&self, frame: impl Into<String>) {
        self.lock().receive_queue.push_back(frame.into());
        self.wake.notify_one();
    }

    /// Simulate the server closing the connection.
    ///
    /// A pending or future `recv()` returns
    /// [`TransportError::ConnectionClosed`] until the next `connect()`.
    pub fn close_from_remote(&self) {
        {
            let mut inner = self.lock();
            inner.connected = false;
            inner.remote_closed = true;
        }
        self.wake.notify_one();
    }

    /// Get all frames that were sent.
    pub fn sent_frames(&self) -> Vec<String> {
        self.lock().sent_frames.clone()
    }

    /// Sent frames decoded as client messages. Undecodable frames are skipped.
    pub fn sent_messages(&self) -> Vec<ClientMessage> {
        self.lock()
            .sent_frames
            .iter()
            .filter_map(|frame| ClientMessage::from_json(frame).ok())
            .collect()
    }

    /// Get the last frame that was sent.
    pub fn last_sent(&self) -> Option<String> {
        self.lock().sent_frames.last().cloned()
    }

    /// Get the URL of the most recent successful connect.
    pub fn connected_url(&self) -> Option<String> {
        self.lock().connect_history.last().cloned()
    }

    /// Number of successful connects.
    pub fn connect_count(&self) -> usize {
        self.lock().connect_history.len()
    }

    /// Cause the next connect() to fail with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        self.lock().fail_next_connect = Some(error.to_string());
    }

    /// Cause the next send() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        self.lock().fail_next_send = Some(error.to_string());
    }

    /// Cause the next recv() to fail with the given error.
    pub fn fail_next_recv(&self, error: &str) {
        self.lock().fail_next_recv = Some(error.to_string());
        self.wake.notify_one();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, url: &str) -> Result<(), TransportError> {
        let mut inner = self.lock();

        // Check for forced failure
        if let Some(error) = inner.fail_next_connect.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.connected = true;
        inner.remote_closed = false;
        inner.connect_history.push(url.to_string());
        Ok(())
    }

    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        let mut inner = self.lock();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        // Check for forced failure
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_frames.push(frame.to_string());
        Ok(())
    }

    async fn recv(&self) -> Result<String, TransportError> {
        loop {
            {
                let mut inner = self.lock();

                if !inner.connected {
                    return Err(if inner.remote_closed {
                        TransportError::ConnectionClosed
                    } else {
                        TransportError::NotConnected
                    });
                }

                // Check for forced failure
                if let Some(error) = inner.fail_next_recv.take() {
                    return Err(TransportError::ReceiveFailed(error));
                }

                if let Some(frame) = inner.receive_queue.pop_front() {
                    return Ok(frame);
                }
            }
            self.wake.notified().await;
        }
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.lock().connected = false;
        self.wake.notify_one();
        Ok(())
    }
}
