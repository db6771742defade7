//! SessionController - applies the session protocol to local state.
//!
//! The controller owns the document, the remote cursor registry and the
//! outbound queue. It is synchronous: inbound frames and local activity go
//! in, [`SessionEvent`]s for the front-end come out, and outgoing messages
//! collect in the queue for the connection to drain.

use std::time::Duration;

use livepad_core::{
    to_position, ChangeDiffEngine, CursorMarker, CursorRegistry, Document, MarkerChange, Origin,
    OutboundQueue,
};
use livepad_types::{
    ChangeData, ClientMessage, EditorChange, Init, Operation, Participant, Position, ServerMessage,
    SessionId, WireError,
};

use crate::config::ClientConfig;
use crate::create::SessionCreateError;

/// Something the front-end should mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The transport opened.
    Connected,
    /// The transport went away.
    Disconnected {
        /// Why.
        reason: String,
        /// Whether a reconnect will be attempted.
        will_reconnect: bool,
    },
    /// A reconnect attempt is scheduled.
    ReconnectScheduled {
        /// Time until the attempt.
        delay: Duration,
    },
    /// The whole document was replaced by a session snapshot.
    DocumentReplaced {
        /// New content.
        text: String,
    },
    /// A remote edit was applied to the document.
    RemoteEdit {
        /// The edit in editor terms, against the text before it.
        change: EditorChange,
        /// The operation as received.
        operation: Operation,
    },
    /// A local edit was applied to the document and queued for sending.
    LocalEdit {
        /// The edit in editor terms, against the text before it.
        change: EditorChange,
        /// The operation that was queued.
        operation: Operation,
    },
    /// A remote cursor marker appeared.
    MarkerPlaced(CursorMarker),
    /// A remote cursor marker went away.
    MarkerRemoved(CursorMarker),
    /// The server told us who we are.
    IdentityAssigned(Participant),
    /// The session changed; the share link changed with it.
    SessionChanged {
        /// New session (`None` for the implicit one).
        session_id: Option<SessionId>,
        /// Link to hand to collaborators.
        share_url: String,
    },
    /// Creating a session failed; the current session is kept.
    SessionCreationFailed {
        /// Why.
        reason: String,
    },
}

impl From<MarkerChange> for SessionEvent {
    fn from(change: MarkerChange) -> Self {
        match change {
            MarkerChange::Placed(marker) => SessionEvent::MarkerPlaced(marker),
            MarkerChange::Removed(marker) => SessionEvent::MarkerRemoved(marker),
        }
    }
}

/// Identifies one session-creation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket(u64);

/// What became of a session-creation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome {
    /// The new session was adopted; the caller must rejoin.
    Adopted(Vec<SessionEvent>),
    /// A newer attempt or a teardown superseded this one.
    Stale,
    /// Creation failed.
    Failed(Vec<SessionEvent>),
}

/// Session protocol state for one client.
#[derive(Debug)]
pub struct SessionController {
    config: ClientConfig,
    document: Document,
    diff: ChangeDiffEngine,
    markers: CursorRegistry,
    outbound: OutboundQueue<ClientMessage>,
    me: Option<Participant>,
    session_id: Option<SessionId>,
    display_name: Option<String>,
    attempt: u64,
}

impl SessionController {
    /// Create a controller for the configured session.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            document: Document::default(),
            diff: ChangeDiffEngine::new(),
            markers: CursorRegistry::new(),
            outbound: OutboundQueue::new(config.queue_capacity),
            me: None,
            session_id: config.session_id.clone(),
            display_name: config.display_name.clone(),
            attempt: 0,
            config: config.clone(),
        }
    }

    /// The shared document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Remote cursor markers.
    pub fn markers(&self) -> &CursorRegistry {
        &self.markers
    }

    /// The local participant, once the server has sent `init`.
    pub fn me(&self) -> Option<&Participant> {
        self.me.as_ref()
    }

    /// The explicit session, if any.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Link collaborators can open to join this session.
    pub fn share_url(&self) -> String {
        self.config
            .share_url(self.session_id.as_ref())
            .unwrap_or_else(|_| self.config.page_url.clone())
    }

    /// Messages waiting to be sent.
    pub fn outbound(&self) -> &OutboundQueue<ClientMessage> {
        &self.outbound
    }

    /// Mutable access to the outbound queue, for draining.
    pub fn outbound_mut(&mut self) -> &mut OutboundQueue<ClientMessage> {
        &mut self.outbound
    }

    /// Local/remote change counters.
    pub fn diff(&self) -> &ChangeDiffEngine {
        &self.diff
    }

    // ===========================================
    // Inbound
    // ===========================================

    /// Decode and apply one inbound frame.
    ///
    /// Unknown message types and undecodable frames are logged and dropped.
    pub fn handle_frame(&mut self, frame: &str) -> Vec<SessionEvent> {
        match ServerMessage::from_json(frame) {
            Ok(msg) => self.handle_message(msg),
            Err(WireError::InvalidMessageType(kind)) => {
                tracing::warn!(message_type = %kind, "ignoring unknown message type");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable frame");
                Vec::new()
            }
        }
    }

    /// Apply one inbound message.
    pub fn handle_message(&mut self, msg: ServerMessage) -> Vec<SessionEvent> {
        tracing::debug!(message_type = msg.message_type().as_str(), "received");
        match msg {
            ServerMessage::Init(init) => self.on_init(init),
            ServerMessage::Change(data) => self.on_remote_change(data),
            ServerMessage::CursorMove(p) | ServerMessage::NameChange(p) => self
                .markers
                .upsert(p.id.clone(), &p.name, p.position())
                .into_iter()
                .map(SessionEvent::from)
                .collect(),
            ServerMessage::RemoveClient(remove) => self
                .markers
                .remove(&remove.uuid)
                .into_iter()
                .map(SessionEvent::from)
                .collect(),
            ServerMessage::Ping => Vec::new(),
        }
    }

    fn on_init(&mut self, init: Init) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if let Some(session) = init.session_id.explicit() {
            if self.session_id.as_ref() != Some(&session) {
                tracing::info!(session = %session, "joined session");
                self.session_id = Some(session);
                events.push(self.session_changed());
            }
        }

        self.document.reset(init.text.clone());
        events.push(SessionEvent::DocumentReplaced { text: init.text });

        self.me = Some(init.me.clone());
        events.push(SessionEvent::IdentityAssigned(init.me));

        events.extend(self.markers.clear().into_iter().map(SessionEvent::from));
        for client in init.clients {
            let pos = client.position();
            let changes = self.markers.upsert(client.id, &client.name, pos);
            events.extend(changes.into_iter().map(SessionEvent::from));
        }

        if let Some(name) = self.display_name.clone() {
            if self.me.as_ref().is_some_and(|me| me.name != name) {
                self.rename(&name);
            }
        }

        events
    }

    fn on_remote_change(&mut self, data: ChangeData) -> Vec<SessionEvent> {
        let notice = match self.document.apply_operation(&data.operation, Origin::Remote) {
            Ok(notice) => notice,
            Err(e) => {
                tracing::warn!(error = %e, "dropping remote change");
                return Vec::new();
            }
        };

        // Remote notices never produce an outgoing operation.
        let echo = self.diff.observe(&notice, self.document.text());
        debug_assert!(echo.is_none());

        vec![SessionEvent::RemoteEdit {
            change: notice.change,
            operation: data.operation,
        }]
    }

    // ===========================================
    // Local activity
    // ===========================================

    /// Apply a local edit and queue the resulting `change`.
    ///
    /// `change` is positioned against the document as it is now, with every
    /// remote edit received so far already applied.
    pub fn local_edit(&mut self, change: EditorChange) -> Vec<SessionEvent> {
        let notice = self.document.apply_change(change, Origin::Local);
        let Some(operation) = self.diff.observe(&notice, self.document.text()) else {
            return Vec::new();
        };

        let data = ChangeData::new(operation.clone(), Some(notice.change.clone()));
        self.enqueue(ClientMessage::Change(data));
        vec![SessionEvent::LocalEdit {
            change: notice.change,
            operation,
        }]
    }

    /// Append `line` after the current last line.
    pub fn append_line(&mut self, line: &str) -> Vec<SessionEvent> {
        let end = to_position(self.document.text(), self.document.len());
        let inserted = if self.document.is_empty() {
            line.to_string()
        } else {
            format!("\n{line}")
        };
        self.local_edit(EditorChange::insert(end, &inserted))
    }

    /// Record a local cursor move and queue a `cursorMove`.
    pub fn move_cursor(&mut self, pos: Position) {
        if let Some(me) = self.me.as_mut() {
            me.pos = Some(pos);
        }
        self.enqueue(ClientMessage::CursorMove(pos));
    }

    /// Change the local display name and queue a `nameChange`.
    ///
    /// The name is re-announced after every future `init`.
    pub fn rename(&mut self, name: &str) {
        if let Some(me) = self.me.as_mut() {
            me.name = name.to_string();
        }
        self.display_name = Some(name.to_string());
        self.enqueue(ClientMessage::NameChange(name.to_string()));
    }

    /// Forget the local identity; the next `init` assigns a new one.
    pub fn on_disconnected(&mut self) {
        self.me = None;
    }

    fn enqueue(&mut self, msg: ClientMessage) {
        if let Some(evicted) = self.outbound.enqueue(msg) {
            tracing::warn!(
                message_type = evicted.message_type().as_str(),
                dropped = self.outbound.dropped_count(),
                "outbound queue full, dropped oldest message"
            );
        }
    }

    // ===========================================
    // Session creation
    // ===========================================

    /// Start a creation attempt. Any earlier attempt becomes stale.
    pub fn begin_session_creation(&mut self) -> SessionTicket {
        self.attempt += 1;
        SessionTicket(self.attempt)
    }

    /// Make every outstanding creation attempt stale.
    pub fn cancel_session_creation(&mut self) {
        self.attempt += 1;
    }

    /// Handle the answer to a creation attempt.
    pub fn finish_session_creation(
        &mut self,
        ticket: SessionTicket,
        result: Result<SessionId, SessionCreateError>,
    ) -> CreationOutcome {
        if ticket.0 != self.attempt {
            tracing::info!(ticket = ticket.0, current = self.attempt, "ignoring stale session creation");
            return CreationOutcome::Stale;
        }

        match result {
            Ok(session) => {
                tracing::info!(session = %session, "created session");
                self.session_id = Some(session);
                CreationOutcome::Adopted(vec![self.session_changed()])
            }
            Err(e) => {
                tracing::error!(error = %e, "session creation failed");
                CreationOutcome::Failed(vec![SessionEvent::SessionCreationFailed {
                    reason: e.to_string(),
                }])
            }
        }
    }

    fn session_changed(&self) -> SessionEvent {
        SessionEvent::SessionChanged {
            session_id: self.session_id.clone(),
            share_url: self.share_url(),
        }
    }
}
