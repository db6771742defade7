//! Editing primitives: positions, operations and editor change descriptors.

use serde::{Deserialize, Serialize};

/// A (line, column) position in a text buffer.
///
/// Both coordinates are zero-based. `ch` counts UTF-16 code units from the
/// start of the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based line index.
    pub line: u32,
    /// Zero-based column within the line.
    pub ch: u32,
}

impl Position {
    /// Create a new position.
    pub const fn new(line: u32, ch: u32) -> Self {
        Self { line, ch }
    }
}

/// Replace the half-open range `[start, end)` with `to_add`.
///
/// Offsets are absolute UTF-16 code unit offsets into the document the
/// operation was computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// First unit replaced.
    pub start: usize,
    /// One past the last unit replaced.
    pub end: usize,
    /// Replacement text.
    #[serde(rename = "toAdd")]
    pub to_add: String,
}

impl Operation {
    /// Create a new operation.
    pub fn new(start: usize, end: usize, to_add: impl Into<String>) -> Self {
        Self {
            start,
            end,
            to_add: to_add.into(),
        }
    }

    /// Pure insertion at `at`.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(at, at, text)
    }

    /// Pure deletion of `[start, end)`.
    pub fn delete(start: usize, end: usize) -> Self {
        Self::new(start, end, String::new())
    }

    /// Number of code units removed.
    pub fn removed_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True when applying the operation changes nothing.
    pub fn is_noop(&self) -> bool {
        self.start == self.end && self.to_add.is_empty()
    }
}

/// A change descriptor as reported by the editing widget.
///
/// `from`/`to` delimit the replaced range in the text *before* the edit;
/// `text` holds the inserted text split on line breaks (an empty insertion
/// is `[""]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorChange {
    /// Start of the replaced range.
    pub from: Position,
    /// End of the replaced range.
    pub to: Position,
    /// Inserted lines.
    pub text: Vec<String>,
    /// Widget-defined origin label (e.g. `+input`, `+delete`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl EditorChange {
    /// Describe replacing `[from, to)` with `inserted`.
    pub fn new(from: Position, to: Position, inserted: &str) -> Self {
        Self {
            from,
            to,
            text: inserted.split('\n').map(str::to_owned).collect(),
            origin: None,
        }
    }

    /// Describe inserting `inserted` at `at`.
    pub fn insert(at: Position, inserted: &str) -> Self {
        Self::new(at, at, inserted)
    }

    /// Attach a widget origin label.
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    /// The inserted text with line breaks restored.
    pub fn inserted_text(&self) -> String {
        self.text.join("\n")
    }
}
