//! ConnectionManager - drives the pure connection state machine.
//!
//! [`ConnectionState`] (from livepad-core) decides; this module performs.
//! It owns the transport and the single optional reconnect deadline, and
//! drains the outbound queue while the transport is open.
//!
//! ```text
//! PadClient → ConnectionManager → Transport → Network
//!                    ↓
//!         livepad-core (pure state machine)
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use livepad_core::{Action, ConnectionEvent, ConnectionState, Event, OutboundQueue};
use livepad_types::ClientMessage;
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::transport::{Transport, TransportError};

/// Owns a transport and runs it through the connection state machine.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    state: ConnectionState,
    /// The one pending reconnect timer, as a deadline.
    reconnect_at: Option<Instant>,
    reconnect_delay: Duration,
    connect_timeout: Duration,
}

impl<T: Transport> ConnectionManager<T> {
    /// Create a manager in the `Disconnected` state.
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport,
            state: ConnectionState::new(),
            reconnect_at: None,
            reconnect_delay: config.reconnect_delay,
            connect_timeout: config.connect_timeout,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True while frames may be sent and received.
    pub fn is_open(&self) -> bool {
        self.state.is_connected()
    }

    /// When the pending reconnect fires, if one is armed.
    pub fn reconnect_deadline(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Open a transport to `url`.
    pub async fn connect(&mut self, url: &str) -> Vec<ConnectionEvent> {
        self.run(Event::ConnectRequested, Some(url)).await
    }

    /// The reconnect deadline passed; reopen to `url`.
    ///
    /// The deadline is cleared before the connect runs.
    pub async fn fire_reconnect_timer(&mut self, url: &str) -> Vec<ConnectionEvent> {
        self.reconnect_at = None;
        self.run(Event::ReconnectTimerFired, Some(url)).await
    }

    /// The transport reported an error or a close.
    pub async fn transport_failed(&mut self, reason: &str) -> Vec<ConnectionEvent> {
        self.run(
            Event::TransportFailed {
                reason: reason.to_string(),
            },
            None,
        )
        .await
    }

    /// Final teardown: no reconnect follows.
    pub async fn teardown(&mut self) -> Vec<ConnectionEvent> {
        self.run(Event::TeardownRequested, None).await
    }

    /// Wait for the next inbound frame.
    pub async fn recv(&self) -> Result<String, TransportError> {
        self.transport.recv().await
    }

    /// Send every queued message in order, stopping at the first failure.
    ///
    /// Does nothing unless the transport is open. A message is removed only
    /// after it has been sent; the failed one stays at the head.
    pub async fn drain(
        &mut self,
        queue: &mut OutboundQueue<ClientMessage>,
    ) -> Result<usize, TransportError> {
        if !self.is_open() {
            return Ok(0);
        }

        let mut sent = 0;
        while let Some(msg) = queue.front() {
            let frame = match msg.to_json() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unencodable outbound message");
                    queue.pop_front();
                    continue;
                }
            };
            self.transport.send(&frame).await?;
            tracing::debug!(%frame, "sent");
            queue.pop_front();
            sent += 1;
        }
        Ok(sent)
    }

    /// Feed one event through the state machine and execute the resulting
    /// actions. Opening a transport produces a follow-up event, handled in
    /// the same call.
    async fn run(&mut self, event: Event, url: Option<&str>) -> Vec<ConnectionEvent> {
        let mut emitted = Vec::new();
        let mut pending = VecDeque::from([event]);

        while let Some(event) = pending.pop_front() {
            let (next, actions) = self.state.on_event(event);
            self.state = next;

            for action in actions {
                match action {
                    Action::OpenTransport => pending.push_back(self.open(url).await),
                    Action::CloseTransport => {
                        if let Err(e) = self.transport.close().await {
                            tracing::debug!(error = %e, "error closing transport");
                        }
                    }
                    Action::ArmReconnectTimer => {
                        if self.reconnect_at.is_none() {
                            tracing::info!(delay = ?self.reconnect_delay, "reconnect scheduled");
                            self.reconnect_at = Some(Instant::now() + self.reconnect_delay);
                        }
                    }
                    Action::CancelReconnectTimer => self.reconnect_at = None,
                    Action::EmitEvent(e) => emitted.push(e),
                }
            }
        }

        emitted
    }

    async fn open(&self, url: Option<&str>) -> Event {
        let Some(url) = url else {
            return Event::TransportFailed {
                reason: "no session url".into(),
            };
        };

        tracing::info!(%url, "connecting");
        let result = match tokio::time::timeout(self.connect_timeout, self.transport.connect(url)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        };

        match result {
            Ok(()) => {
                tracing::info!("connected");
                Event::TransportOpened
            }
            Err(e) => {
                tracing::warn!(error = %e, "connect failed");
                Event::TransportFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use livepad_types::Position;

    const URL: &str = "ws://pad/coding/connect/";

    fn manager() -> (ConnectionManager<MockTransport>, MockTransport) {
        let transport = MockTransport::new();
        let manager = ConnectionManager::new(transport.clone(), &ClientConfig::default());
        (manager, transport)
    }

    fn cursor(ch: u32) -> ClientMessage {
        ClientMessage::CursorMove(Position::new(0, ch))
    }

    // ===========================================
    // Lifecycle Tests
    // ===========================================

    #[tokio::test]
    async fn connect_opens_transport() {
        let (mut manager, transport) = manager();

        let events = manager.connect(URL).await;

        assert!(manager.is_open());
        assert_eq!(events, vec![ConnectionEvent::Connected]);
        assert_eq!(transport.connected_url().as_deref(), Some(URL));
    }

    #[tokio::test]
    async fn connect_failure_schedules_reconnect() {
        let (mut manager, transport) = manager();
        transport.fail_next_connect("refused");

        let events = manager.connect(URL).await;

        assert!(manager.state().is_reconnect_scheduled());
        assert!(manager.reconnect_deadline().is_some());
        assert!(matches!(
            events.as_slice(),
            [ConnectionEvent::Disconnected { will_reconnect: true, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_deadline_uses_configured_delay() {
        let (mut manager, _transport) = manager();
        manager.connect(URL).await;

        let before = Instant::now();
        manager.transport_failed("reset").await;

        assert_eq!(
            manager.reconnect_deadline(),
            Some(before + Duration::from_secs(3))
        );
    }

    #[tokio::test]
    async fn repeated_failures_keep_one_deadline() {
        let (mut manager, _transport) = manager();
        manager.connect(URL).await;

        manager.transport_failed("error").await;
        let deadline = manager.reconnect_deadline();
        let events = manager.transport_failed("close").await;

        assert!(events.is_empty());
        assert_eq!(manager.reconnect_deadline(), deadline);
    }

    #[tokio::test]
    async fn timer_fire_reconnects_once() {
        let (mut manager, transport) = manager();
        manager.connect(URL).await;
        manager.transport_failed("reset").await;

        let events = manager.fire_reconnect_timer(URL).await;

        assert_eq!(events, vec![ConnectionEvent::Connected]);
        assert!(manager.reconnect_deadline().is_none());
        assert_eq!(transport.connect_count(), 2);

        // A stale fire is ignored.
        manager.fire_reconnect_timer(URL).await;
        assert_eq!(transport.connect_count(), 2);
    }

    #[tokio::test]
    async fn teardown_is_final() {
        let (mut manager, transport) = manager();
        manager.connect(URL).await;

        let events = manager.teardown().await;
        assert!(matches!(
            events.as_slice(),
            [ConnectionEvent::Disconnected { will_reconnect: false, .. }]
        ));
        assert!(!transport.is_connected());

        // The close notification arriving afterwards arms nothing.
        manager.transport_failed("closed").await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.reconnect_deadline().is_none());
    }

    #[tokio::test]
    async fn teardown_cancels_pending_reconnect() {
        let (mut manager, _transport) = manager();
        manager.connect(URL).await;
        manager.transport_failed("reset").await;

        manager.teardown().await;

        assert!(manager.reconnect_deadline().is_none());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    /// A transport whose handshake never completes.
    struct StalledTransport;

    #[async_trait::async_trait]
    impl Transport for StalledTransport {
        async fn connect(&self, _url: &str) -> Result<(), TransportError> {
            std::future::pending().await
        }

        async fn send(&self, _frame: &str) -> Result<(), TransportError> {
            Err(TransportError::NotConnected)
        }

        async fn recv(&self) -> Result<String, TransportError> {
            Err(TransportError::NotConnected)
        }

        fn is_connected(&self) -> bool {
            false
        }

        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_handshake_times_out_and_schedules_reconnect() {
        let config = ClientConfig::default().with_connect_timeout(Duration::from_secs(2));
        let mut manager = ConnectionManager::new(StalledTransport, &config);

        let started = Instant::now();
        let events = manager.connect(URL).await;

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(manager.state().is_reconnect_scheduled());
        assert!(matches!(
            events.as_slice(),
            [ConnectionEvent::Disconnected { reason, will_reconnect: true }]
                if reason == &TransportError::Timeout.to_string()
        ));
    }

    // ===========================================
    // Drain Tests
    // ===========================================

    #[tokio::test]
    async fn drain_does_nothing_while_closed() {
        let (mut manager, transport) = manager();
        let mut queue = OutboundQueue::new(10);
        queue.enqueue(cursor(1));

        assert_eq!(manager.drain(&mut queue).await.unwrap(), 0);
        assert_eq!(queue.len(), 1);
        assert!(transport.sent_frames().is_empty());
    }

    #[tokio::test]
    async fn drain_sends_everything_in_order() {
        let (mut manager, transport) = manager();
        manager.connect(URL).await;

        let mut queue = OutboundQueue::new(10);
        for ch in 0..3 {
            queue.enqueue(cursor(ch));
        }

        assert_eq!(manager.drain(&mut queue).await.unwrap(), 3);
        assert!(queue.is_empty());
        assert_eq!(
            transport.sent_messages(),
            vec![cursor(0), cursor(1), cursor(2)]
        );
    }

    #[tokio::test]
    async fn send_failure_keeps_message_at_head() {
        let (mut manager, transport) = manager();
        manager.connect(URL).await;

        let mut queue = OutboundQueue::new(10);
        queue.enqueue(cursor(0));
        queue.enqueue(cursor(1));
        transport.fail_next_send("broken pipe");

        assert!(manager.drain(&mut queue).await.is_err());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.front(), Some(&cursor(0)));

        assert_eq!(manager.drain(&mut queue).await.unwrap(), 2);
        assert_eq!(transport.sent_messages(), vec![cursor(0), cursor(1)]);
    }
}
