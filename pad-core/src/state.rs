//! Connection state machine for livepad.
//!
//! This module provides a pure, side-effect-free state machine for managing
//! the transport lifecycle. The state machine takes events as input and
//! produces a new state plus a list of actions to execute.
//!
//! The actual I/O (opening sockets, arming timers) is performed by
//! livepad-client, not by this module. This enables instant unit testing
//! without network mocks.
//!
//! ```text
//!                 ConnectRequested            TransportOpened
//!  Disconnected ───────────────────► Connecting ─────────────► Connected
//!       ▲                               ▲    │                     │
//!       │ TeardownRequested             │    │ TransportFailed     │ TransportFailed
//!       │ (from any state)              │    ▼                     │
//!       │                      ReconnectTimerFired                 │
//!       └──────────────────── ReconnectScheduled ◄─────────────────┘
//! ```
//!
//! `ReconnectScheduled` is the only state with an armed timer, so a failure
//! reported while already scheduled cannot arm a second one.

/// Connection state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport, no timer.
    #[default]
    Disconnected,
    /// Transport open in progress.
    Connecting,
    /// Transport open.
    Connected,
    /// Transport lost; one reconnect timer is armed.
    ReconnectScheduled,
}

impl ConnectionState {
    /// Create a new state machine in the Disconnected state.
    pub fn new() -> Self {
        Self::Disconnected
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (livepad-client)
    /// is responsible for executing the returned actions in order.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match (self, event) {
            // From Disconnected
            (Self::Disconnected, Event::ConnectRequested) => {
                (Self::Connecting, vec![Action::OpenTransport])
            }
            // A transport that opens after teardown must not stay live.
            (Self::Disconnected, Event::TransportOpened) => {
                (Self::Disconnected, vec![Action::CloseTransport])
            }

            // From Connecting
            (Self::Connecting, Event::TransportOpened) => (
                Self::Connected,
                vec![Action::EmitEvent(ConnectionEvent::Connected)],
            ),

            // Failure while connecting or connected
            (Self::Connecting | Self::Connected, Event::TransportFailed { reason }) => (
                Self::ReconnectScheduled,
                vec![
                    Action::CloseTransport,
                    Action::ArmReconnectTimer,
                    Action::EmitEvent(ConnectionEvent::Disconnected {
                        reason,
                        will_reconnect: true,
                    }),
                ],
            ),

            // From ReconnectScheduled
            (Self::ReconnectScheduled, Event::ReconnectTimerFired) => {
                (Self::Connecting, vec![Action::OpenTransport])
            }
            (Self::ReconnectScheduled, Event::ConnectRequested) => (
                Self::Connecting,
                vec![Action::CancelReconnectTimer, Action::OpenTransport],
            ),

            // Explicit teardown
            (Self::Connecting | Self::Connected, Event::TeardownRequested) => (
                Self::Disconnected,
                vec![
                    Action::CloseTransport,
                    Action::EmitEvent(ConnectionEvent::Disconnected {
                        reason: "teardown requested".into(),
                        will_reconnect: false,
                    }),
                ],
            ),
            (Self::ReconnectScheduled, Event::TeardownRequested) => {
                (Self::Disconnected, vec![Action::CancelReconnectTimer])
            }

            // Everything else (duplicate failures, stray timers, repeated
            // connect requests) leaves the state untouched.
            (state, _) => (state, vec![]),
        }
    }

    /// Check if the transport is open.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if a reconnect timer is pending.
    pub fn is_reconnect_scheduled(&self) -> bool {
        matches!(self, Self::ReconnectScheduled)
    }
}

/// Events that can occur in the connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Caller asked to connect.
    ConnectRequested,
    /// Transport reported open.
    TransportOpened,
    /// Transport reported an error or closed.
    TransportFailed {
        /// Human-readable cause.
        reason: String,
    },
    /// The reconnect timer fired (its handle already cleared).
    ReconnectTimerFired,
    /// Caller asked for a final, non-reconnecting teardown.
    TeardownRequested,
}

/// Actions to be executed by livepad-client.
///
/// These are instructions, not side effects. livepad-client interprets
/// these and performs the actual I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open a transport to the session URL.
    OpenTransport,
    /// Close the current transport, ignoring its close notification.
    CloseTransport,
    /// Arm the single reconnect timer.
    ArmReconnectTimer,
    /// Cancel the pending reconnect timer.
    CancelReconnectTimer,
    /// Emit an event to the session layer.
    EmitEvent(ConnectionEvent),
}

/// Events emitted to the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Transport is open.
    Connected,
    /// Transport is gone.
    Disconnected {
        /// Why.
        reason: String,
        /// Whether a reconnect timer was armed.
        will_reconnect: bool,
    },
}
