//! PadClient - the main interface for livepad.
//!
//! This module provides [`PadClient`], the event loop a front-end runs to
//! take part in a shared editing session, and [`ClientHandle`], the cheap
//! cloneable handle the front-end uses to feed it local activity.
//!
//! # Architecture
//!
//! One task owns everything mutable. It selects over inbound frames,
//! front-end commands, the drain tick, the reconnect deadline, the
//! post-create settle deadline and finished session creations, handling
//! one at a time.
//!
//! ```text
//! Front-end ─ ClientHandle ─► PadClient ─► ConnectionManager ─► Transport
//!     ▲                          │
//!     └──── SessionEvent ◄─ SessionController
//! ```
//!
//! # Example
//!
//! ```ignore
//! use livepad_client::{ClientConfig, MockSessionCreator, MockTransport, PadClient};
//!
//! let (client, handle, mut events) =
//!     PadClient::new(ClientConfig::default(), MockTransport::new(), MockSessionCreator::new())?;
//! let task = tokio::spawn(client.run());
//!
//! handle.rename("ada")?;
//! handle.shutdown()?;
//! task.await??;
//! ```

use std::sync::Arc;

use livepad_core::ConnectionEvent;
use livepad_types::{EditorChange, Position, SessionId, WireError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ClientConfig;
use crate::connection::ConnectionManager;
use crate::create::{SessionCreateError, SessionCreator};
use crate::session::{CreationOutcome, SessionController, SessionEvent, SessionTicket};
use crate::transport::{Transport, TransportError};

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Wire format error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Session creation error.
    #[error("session creation failed: {0}")]
    SessionCreate(#[from] SessionCreateError),

    /// Configuration that cannot produce valid URLs.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The event loop is no longer running.
    #[error("client is not running")]
    Closed,
}

/// Local activity sent from the front-end to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The user edited the document.
    Edit(EditorChange),
    /// Append a line after the current last line.
    AppendLine(String),
    /// The user's cursor moved.
    MoveCursor(Position),
    /// The user changed their display name.
    Rename(String),
    /// Create a new session and move into it.
    CreateSession,
    /// Stop for good.
    Shutdown,
}

/// Handle for feeding local activity to a running [`PadClient`].
#[derive(Debug, Clone)]
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ClientHandle {
    fn send(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).map_err(|_| ClientError::Closed)
    }

    /// Report a contiguous edit against the current document.
    pub fn edit(&self, change: EditorChange) -> Result<(), ClientError> {
        self.send(Command::Edit(change))
    }

    /// Append `line` to the end of the document.
    ///
    /// The position is resolved by the event loop against the document as
    /// it stands when the command runs.
    pub fn append_line(&self, line: &str) -> Result<(), ClientError> {
        self.send(Command::AppendLine(line.to_string()))
    }

    /// Report a cursor move.
    pub fn move_cursor(&self, pos: Position) -> Result<(), ClientError> {
        self.send(Command::MoveCursor(pos))
    }

    /// Change the display name.
    pub fn rename(&self, name: &str) -> Result<(), ClientError> {
        self.send(Command::Rename(name.to_string()))
    }

    /// Create a new session and rejoin into it.
    pub fn create_session(&self) -> Result<(), ClientError> {
        self.send(Command::CreateSession)
    }

    /// Stop the client. No reconnect follows.
    pub fn shutdown(&self) -> Result<(), ClientError> {
        self.send(Command::Shutdown)
    }

    /// True while the event loop is accepting commands.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

type Creation = (SessionTicket, Result<SessionId, SessionCreateError>);

/// The client event loop.
///
/// Build with [`PadClient::new`], then drive with [`PadClient::run`].
pub struct PadClient<T: Transport, C: SessionCreator> {
    config: ClientConfig,
    session: SessionController,
    connection: ConnectionManager<T>,
    creator: Arc<C>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
    creations_tx: mpsc::UnboundedSender<Creation>,
    creations_rx: mpsc::UnboundedReceiver<Creation>,
    /// When to join a freshly created session.
    settle_at: Option<Instant>,
}

impl<T: Transport, C: SessionCreator> PadClient<T, C> {
    /// Create a client plus its command handle and event stream.
    pub fn new(
        config: ClientConfig,
        transport: T,
        creator: C,
    ) -> Result<(Self, ClientHandle, mpsc::UnboundedReceiver<SessionEvent>), ClientError> {
        config.validate()?;

        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();
        let (creations_tx, creations_rx) = mpsc::unbounded_channel();

        let client = Self {
            session: SessionController::new(&config),
            connection: ConnectionManager::new(transport, &config),
            creator: Arc::new(creator),
            commands,
            events,
            creations_tx,
            creations_rx,
            settle_at: None,
            config,
        };
        let handle = ClientHandle {
            commands: commands_tx,
        };
        Ok((client, handle, events_rx))
    }

    /// Run until [`ClientHandle::shutdown`] is called or every handle is
    /// dropped.
    ///
    /// Transport failures never end the loop; they schedule a reconnect.
    pub async fn run(mut self) -> Result<(), ClientError> {
        tracing::info!(session = ?self.session.session_id(), "starting client");
        self.connect().await?;

        let mut drain = tokio::time::interval(self.config.drain_interval);
        drain.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                frame = self.connection.recv(), if self.connection.is_open() => match frame {
                    Ok(frame) => {
                        let events = self.session.handle_frame(&frame);
                        self.emit(events);
                    }
                    Err(e) => self.transport_failed(e).await,
                },
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                _ = drain.tick() => self.drain().await,
                _ = sleep_until(self.connection.reconnect_deadline()) => self.reconnect().await?,
                _ = sleep_until(self.settle_at) => {
                    self.settle_at = None;
                    self.connect().await?;
                }
                Some((ticket, result)) = self.creations_rx.recv() => {
                    self.finish_creation(ticket, result).await;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Edit(change) => {
                let events = self.session.local_edit(change);
                self.emit(events);
            }
            Command::AppendLine(line) => {
                let events = self.session.append_line(&line);
                self.emit(events);
            }
            Command::MoveCursor(pos) => self.session.move_cursor(pos),
            Command::Rename(name) => self.session.rename(&name),
            Command::CreateSession => self.begin_creation(),
            Command::Shutdown => {}
        }
    }

    async fn connect(&mut self) -> Result<(), ClientError> {
        let url = self.config.connect_url(self.session.session_id())?;
        let events = self.connection.connect(&url).await;
        self.publish(events);
        Ok(())
    }

    async fn reconnect(&mut self) -> Result<(), ClientError> {
        let url = self.config.connect_url(self.session.session_id())?;
        let events = self.connection.fire_reconnect_timer(&url).await;
        self.publish(events);
        Ok(())
    }

    async fn transport_failed(&mut self, error: TransportError) {
        tracing::warn!(error = %error, "transport failed");
        let events = self.connection.transport_failed(&error.to_string()).await;
        self.publish(events);
    }

    async fn drain(&mut self) {
        match self.connection.drain(self.session.outbound_mut()).await {
            Ok(0) => {}
            Ok(sent) => tracing::debug!(sent, "drained outbound queue"),
            Err(e) => self.transport_failed(e).await,
        }
    }

    fn begin_creation(&mut self) {
        let ticket = self.session.begin_session_creation();
        let creator = Arc::clone(&self.creator);
        let done = self.creations_tx.clone();

        tokio::spawn(async move {
            let result = creator.create_session().await;
            // The loop is gone after shutdown; the result is dropped then.
            let _ = done.send((ticket, result));
        });
    }

    async fn finish_creation(
        &mut self,
        ticket: SessionTicket,
        result: Result<SessionId, SessionCreateError>,
    ) {
        match self.session.finish_session_creation(ticket, result) {
            CreationOutcome::Adopted(events) => {
                self.emit(events);
                let events = self.connection.teardown().await;
                self.publish(events);
                self.settle_at = Some(Instant::now() + self.config.settle_delay);
            }
            CreationOutcome::Failed(events) => self.emit(events),
            CreationOutcome::Stale => {}
        }
    }

    async fn shutdown(&mut self) {
        // Flush what the user already typed.
        self.drain().await;

        self.session.cancel_session_creation();
        self.settle_at = None;
        let events = self.connection.teardown().await;
        self.publish(events);
        tracing::info!("client stopped");
    }

    fn publish(&mut self, events: Vec<ConnectionEvent>) {
        for event in events {
            match event {
                ConnectionEvent::Connected => self.emit(vec![SessionEvent::Connected]),
                ConnectionEvent::Disconnected {
                    reason,
                    will_reconnect,
                } => {
                    self.session.on_disconnected();
                    let mut out = vec![SessionEvent::Disconnected {
                        reason,
                        will_reconnect,
                    }];
                    if will_reconnect {
                        out.push(SessionEvent::ReconnectScheduled {
                            delay: self.config.reconnect_delay,
                        });
                    }
                    self.emit(out);
                }
            }
        }
    }

    fn emit(&self, events: Vec<SessionEvent>) {
        for event in events {
            if self.events.send(event).is_err() {
                break;
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
