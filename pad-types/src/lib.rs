//! # livepad-types
//!
//! Wire format types for the livepad collaborative editing protocol.
//!
//! This crate provides the foundational types used across all livepad crates:
//! - [`Position`], [`Operation`], [`EditorChange`] - Editing primitives
//! - [`ParticipantId`], [`SessionId`], [`Participant`] - Identity types
//! - [`Envelope`] - The `{type, data}` JSON wrapper every frame travels in
//! - [`ServerMessage`], [`ClientMessage`] - Protocol messages
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod edit;
mod envelope;
mod error;
mod ids;
mod messages;

pub use edit::{EditorChange, Operation, Position};
pub use envelope::{Envelope, MessageType};
pub use error::WireError;
pub use ids::{ParticipantId, SessionId};
pub use messages::{ChangeData, ClientMessage, Init, Participant, RemoveClient, ServerMessage};
