//! # livepad-core
//!
//! Pure logic for livepad (no I/O, instant tests).
//!
//! This crate implements the algorithms and state machines of the
//! synchronization client without any network or timer I/O, enabling fast
//! unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (WebSocket, HTTP, timers) is performed by `livepad-client`,
//! which interprets the actions produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diff;
pub mod document;
pub mod markers;
pub mod offset;
pub mod queue;
pub mod state;

pub use diff::{apply_operation, compute_operation, ChangeDiffEngine, OperationError};
pub use document::{ChangeNotice, Document, Origin};
pub use markers::{label_hue, CursorMarker, CursorRegistry, MarkerChange, MarkerId};
pub use offset::{to_offset, to_position, utf16_len};
pub use queue::{OutboundQueue, DEFAULT_QUEUE_CAPACITY};
pub use state::{Action, ConnectionEvent, ConnectionState, Event};
