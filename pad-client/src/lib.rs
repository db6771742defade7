//! # livepad-client
//!
//! Synchronization client for livepad collaborative editing sessions.
//!
//! This is the library a front-end (the editing widget) embeds to take part
//! in a shared document.
//!
//! ## Features
//!
//! - **Echo-free sync**: local edits become operations, remote operations
//!   are applied without being re-sent
//! - **Automatic recovery**: a single fixed-delay reconnect timer after any
//!   transport error or close
//! - **Ordered delivery**: outbound messages leave in the order they were
//!   produced, buffered while offline
//! - **Remote cursors**: one labelled marker per remote participant
//! - **Transport Abstraction**: Pluggable transport layer (WebSocket, mock)
//!
//! ## Example
//!
//! ```ignore
//! use livepad_client::{ClientConfig, HttpSessionCreator, PadClient, WebSocketTransport};
//!
//! let config = ClientConfig::new("wss://example.com/pad", "https://example.com/pad");
//! let creator = HttpSessionCreator::new(&config)?;
//! let (client, handle, mut events) = PadClient::new(config, WebSocketTransport::new(), creator)?;
//! tokio::spawn(client.run());
//!
//! handle.edit(EditorChange::insert(Position::new(0, 0), "hello"))?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod connection;
pub mod create;
pub mod session;
pub mod transport;

pub use client::{ClientError, ClientHandle, Command, PadClient};
pub use config::ClientConfig;
pub use connection::ConnectionManager;
pub use create::{HttpSessionCreator, MockSessionCreator, SessionCreateError, SessionCreator};
pub use session::{CreationOutcome, SessionController, SessionEvent, SessionTicket};
pub use transport::{
    MockTransport, Transport, TransportError, WebSocketConfig, WebSocketTransport, MAX_FRAME_SIZE,
};
