//! Change diff engine.
//!
//! Turns a local editor change into a canonical [`Operation`] by comparing
//! the text before and after the edit. Only the replaced range comes from
//! the widget; the inserted text is recovered from the new text itself:
//!
//! ```text
//! old:  [ prefix ][ replaced ][ suffix ]
//! new:  [ prefix ][ inserted      ][ suffix ]
//!                 ^start          ^new_len - suffix_len
//! ```
//!
//! This holds for any single contiguous insert, delete or replace. A change
//! event that collapses several disjoint edits produces a wrong operation;
//! nothing here can detect that.

use livepad_types::{EditorChange, Operation};
use thiserror::Error;

use crate::document::{ChangeNotice, Origin};
use crate::offset::{byte_index, to_offset, utf16_len};

/// Errors from replaying an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// `start` is after `end`.
    #[error("inverted range: start {start} > end {end}")]
    Inverted {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
    },

    /// The range extends past the end of the text.
    #[error("range end {end} out of bounds (text length {len})")]
    OutOfBounds {
        /// Range end.
        end: usize,
        /// Length of the text in UTF-16 code units.
        len: usize,
    },
}

/// Compute the operation that turns `old` into `new`.
///
/// `change.from`/`change.to` describe the edited range in `old`.
pub fn compute_operation(old: &str, new: &str, change: &EditorChange) -> Operation {
    let start = to_offset(old, change.from);
    let end = to_offset(old, change.to).max(start);

    let suffix_len = utf16_len(old) - end;
    let cut = utf16_len(new).saturating_sub(suffix_len).max(start);
    let to_add = new[byte_index(new, start)..byte_index(new, cut)].to_string();

    Operation::new(start, end, to_add)
}

/// Replay `op` against `text`: delete `[start, end)`, insert `to_add` at `start`.
pub fn apply_operation(text: &str, op: &Operation) -> Result<String, OperationError> {
    if op.start > op.end {
        return Err(OperationError::Inverted {
            start: op.start,
            end: op.end,
        });
    }
    let len = utf16_len(text);
    if op.end > len {
        return Err(OperationError::OutOfBounds { end: op.end, len });
    }

    let start = byte_index(text, op.start);
    let end = byte_index(text, op.end);

    let mut out = String::with_capacity(text.len() - (end - start) + op.to_add.len());
    out.push_str(&text[..start]);
    out.push_str(&op.to_add);
    out.push_str(&text[end..]);
    Ok(out)
}

/// Observes document change notices and emits operations for local edits.
///
/// Remote-origin notices are counted and dropped, so applying a received
/// edit can never produce an outgoing one.
#[derive(Debug, Default)]
pub struct ChangeDiffEngine {
    local: u64,
    suppressed: u64,
}

impl ChangeDiffEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a change notice. `after` is the document text after the edit.
    pub fn observe(&mut self, notice: &ChangeNotice, after: &str) -> Option<Operation> {
        match notice.origin {
            Origin::Local => {
                self.local += 1;
                Some(compute_operation(&notice.before, after, &notice.change))
            }
            Origin::Remote => {
                self.suppressed += 1;
                None
            }
        }
    }

    /// Number of local notices turned into operations.
    pub fn local_count(&self) -> u64 {
        self.local
    }

    /// Number of remote notices ignored.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livepad_types::Position;
    use proptest::prelude::*;

    fn change(from: (u32, u32), to: (u32, u32), inserted: &str) -> EditorChange {
        EditorChange::new(
            Position::new(from.0, from.1),
            Position::new(to.0, to.1),
            inserted,
        )
    }

    // ===========================================
    // compute_operation
    // ===========================================

    #[test]
    fn replace_word() {
        let op = compute_operation(
            "hello world",
            "hello there",
            &change((0, 6), (0, 11), "there"),
        );
        assert_eq!(op, Operation::new(6, 11, "there"));
        assert_eq!(apply_operation("hello world", &op).unwrap(), "hello there");
    }

    #[test]
    fn multi_line_insert() {
        let old = "ab\ncd";
        let new = "ab\nXY\ncd";
        assert_eq!(to_offset(old, Position::new(1, 0)), 3);

        let op = compute_operation(old, new, &change((0, 2), (0, 2), "\nXY"));
        assert_eq!(op, Operation::insert(2, "\nXY"));
        assert_eq!(apply_operation(old, &op).unwrap(), new);
    }

    #[test]
    fn multi_line_delete() {
        let old = "one\ntwo\nthree";
        let new = "onree";
        let op = compute_operation(old, new, &change((0, 2), (2, 2), ""));

        assert_eq!(op, Operation::delete(2, 10));
        assert_eq!(apply_operation(old, &op).unwrap(), new);
    }

    #[test]
    fn insert_into_empty_document() {
        let op = compute_operation("", "hi\nthere", &change((0, 0), (0, 0), "hi\nthere"));
        assert_eq!(op, Operation::insert(0, "hi\nthere"));
    }

    #[test]
    fn repeated_text_is_resolved_by_range() {
        // "aaa" -> "aaaa" with the insertion reported at column 1.
        let op = compute_operation("aaa", "aaaa", &change((0, 1), (0, 1), "a"));
        assert_eq!(op, Operation::insert(1, "a"));
    }

    #[test]
    fn multibyte_text_uses_character_offsets() {
        let op = compute_operation("naïve", "naïvely", &change((0, 5), (0, 5), "ly"));
        assert_eq!(op, Operation::insert(5, "ly"));
        assert_eq!(apply_operation("naïve", &op).unwrap(), "naïvely");
    }

    #[test]
    fn astral_characters_count_as_two_units() {
        let op = compute_operation("😀a", "😀ba", &change((0, 2), (0, 2), "b"));
        assert_eq!(op, Operation::insert(2, "b"));

        let op = compute_operation("a😀b", "ab", &change((0, 1), (0, 3), ""));
        assert_eq!(op, Operation::delete(1, 3));
    }

    #[test]
    fn contract_violation_does_not_panic() {
        // Two disjoint edits collapsed into one change: result is wrong but bounded.
        let op = compute_operation("abcdef", "Xbcdeg", &change((0, 5), (0, 6), "g"));
        assert!(op.start <= op.end);
    }

    // ===========================================
    // apply_operation
    // ===========================================

    #[test]
    fn apply_rejects_inverted_range() {
        let result = apply_operation("abc", &Operation::new(2, 1, ""));
        assert_eq!(result, Err(OperationError::Inverted { start: 2, end: 1 }));
    }

    #[test]
    fn apply_rejects_out_of_bounds() {
        let result = apply_operation("abc", &Operation::new(1, 9, ""));
        assert_eq!(result, Err(OperationError::OutOfBounds { end: 9, len: 3 }));
    }

    #[test]
    fn apply_matches_browser_offsets_after_emoji() {
        assert_eq!(apply_operation("😀a", &Operation::insert(2, "b")).unwrap(), "😀ba");
        assert_eq!(apply_operation("😀a", &Operation::insert(3, "b")).unwrap(), "😀ab");
        assert_eq!(
            apply_operation("😀a", &Operation::new(4, 4, "")),
            Err(OperationError::OutOfBounds { end: 4, len: 3 })
        );
    }

    #[test]
    fn apply_at_end_appends() {
        assert_eq!(apply_operation("abc", &Operation::insert(3, "d")).unwrap(), "abcd");
    }

    // ===========================================
    // ChangeDiffEngine
    // ===========================================

    #[test]
    fn engine_emits_for_local_only() {
        let mut engine = ChangeDiffEngine::new();
        let edit = change((0, 0), (0, 0), "x");

        let local = ChangeNotice {
            origin: Origin::Local,
            change: edit.clone(),
            before: "ab".into(),
        };
        let remote = ChangeNotice {
            origin: Origin::Remote,
            change: edit,
            before: "ab".into(),
        };

        assert_eq!(engine.observe(&local, "xab"), Some(Operation::insert(0, "x")));
        assert_eq!(engine.observe(&remote, "xab"), None);
        assert_eq!(engine.local_count(), 1);
        assert_eq!(engine.suppressed_count(), 1);
    }

    // ===========================================
    // Round-trip property
    // ===========================================

    /// A document plus one contiguous edit, with offsets on character boundaries.
    fn arb_edit() -> impl Strategy<Value = (String, usize, usize, String)> {
        ("[a-c\n é😀]{0,24}", "[x-z\n😀]{0,8}").prop_flat_map(|(old, inserted)| {
            let chars = old.chars().count();
            (Just(old), 0..=chars, 0..=chars, Just(inserted)).prop_map(|(old, a, b, ins)| {
                let start = units_before(&old, a.min(b));
                let end = units_before(&old, a.max(b));
                (old, start, end, ins)
            })
        })
    }

    fn units_before(text: &str, chars: usize) -> usize {
        text.chars().take(chars).map(char::len_utf16).sum()
    }

    proptest! {
        #[test]
        fn replaying_computed_operation_reconstructs_new_text(
            (old, start, end, inserted) in arb_edit()
        ) {
            let expected = Operation::new(start, end, inserted.clone());
            let new = apply_operation(&old, &expected).unwrap();
            let edit = EditorChange::new(
                crate::offset::to_position(&old, start),
                crate::offset::to_position(&old, end),
                &inserted,
            );

            let op = compute_operation(&old, &new, &edit);

            prop_assert_eq!(&op, &expected);
            prop_assert_eq!(apply_operation(&old, &op).unwrap(), new);
        }
    }
}
