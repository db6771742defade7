//! The shared document buffer.
//!
//! Every mutation carries an [`Origin`]. Mutations return a
//! [`ChangeNotice`] holding the text before the edit, which the
//! [`ChangeDiffEngine`](crate::ChangeDiffEngine) turns into an outgoing
//! operation for local edits only.

use livepad_types::{EditorChange, Operation};

use crate::diff::OperationError;
use crate::offset::{byte_index, to_offset, to_position, utf16_len};

/// Where a document mutation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Typed by the local user.
    Local,
    /// Received from another participant.
    Remote,
}

/// Notification produced by every document mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    /// Who caused the mutation.
    pub origin: Origin,
    /// The edit, in editor terms, against `before`.
    pub change: EditorChange,
    /// Document text before the mutation.
    pub before: String,
}

/// The session's text buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    /// Create a document with the given content.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Current content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        utf16_len(&self.text)
    }

    /// True when the document is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the whole content (session snapshot). Not an edit: no notice.
    pub fn reset(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Apply an editor change. Positions outside the text are clamped.
    pub fn apply_change(&mut self, change: EditorChange, origin: Origin) -> ChangeNotice {
        let start = to_offset(&self.text, change.from);
        let end = to_offset(&self.text, change.to).max(start);
        let inserted = change.inserted_text();

        let start_byte = byte_index(&self.text, start);
        let end_byte = byte_index(&self.text, end);

        let mut after = String::with_capacity(self.text.len() + inserted.len());
        after.push_str(&self.text[..start_byte]);
        after.push_str(&inserted);
        after.push_str(&self.text[end_byte..]);

        let before = std::mem::replace(&mut self.text, after);
        ChangeNotice {
            origin,
            change,
            before,
        }
    }

    /// Apply an offset-based operation.
    ///
    /// The operation is validated against the current text first; an invalid
    /// range leaves the document untouched.
    pub fn apply_operation(
        &mut self,
        op: &Operation,
        origin: Origin,
    ) -> Result<ChangeNotice, OperationError> {
        if op.start > op.end {
            return Err(OperationError::Inverted {
                start: op.start,
                end: op.end,
            });
        }
        let len = self.len();
        if op.end > len {
            return Err(OperationError::OutOfBounds { end: op.end, len });
        }

        let change = EditorChange::new(
            to_position(&self.text, op.start),
            to_position(&self.text, op.end),
            &op.to_add,
        );
        Ok(self.apply_change(change, origin))
    }
}
