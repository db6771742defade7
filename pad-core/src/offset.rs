//! Offset translation between (line, column) positions and absolute
//! offsets.
//!
//! Offsets and columns count UTF-16 code units, the unit browser peers use
//! for string indices. A character outside the Basic Multilingual Plane
//! takes two units. Lines are separated by `\n`; each line break occupies
//! one unit.
//!
//! Out-of-range input is clamped rather than rejected:
//! - a line past the last line maps to the end of the text,
//! - a column past the end of its line maps to the end of that line,
//! - an offset past the end of the text maps to the final position.

use livepad_types::Position;

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Convert a position in `text` to an absolute offset.
///
/// The result is always `<= utf16_len(text)`.
pub fn to_offset(text: &str, pos: Position) -> usize {
    let target = pos.line as usize;
    let mut offset = 0;

    for (index, line) in text.split('\n').enumerate() {
        let len = utf16_len(line);
        if index == target {
            return offset + len.min(pos.ch as usize);
        }
        offset += len + 1;
    }

    // Every line counted a trailing break; the last one does not exist.
    offset.saturating_sub(1)
}

/// Convert an absolute offset in `text` to a position.
pub fn to_position(text: &str, offset: usize) -> Position {
    let mut line_start = 0;
    let mut last = Position::default();

    for (index, line) in text.split('\n').enumerate() {
        let len = utf16_len(line);
        if offset <= line_start + len {
            return Position::new(index as u32, (offset - line_start) as u32);
        }
        line_start += len + 1;
        last = Position::new(index as u32, len as u32);
    }

    last
}

/// Byte index of the character at `offset`, or `text.len()` past the end.
///
/// An offset that falls between the two halves of a surrogate pair maps to
/// the start of that character.
pub(crate) fn byte_index(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (index, c) in text.char_indices() {
        let next = units + c.len_utf16();
        if next > offset {
            return index;
        }
        units = next;
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // to_offset
    // ===========================================

    #[test]
    fn first_line_offset_is_column() {
        assert_eq!(to_offset("hello world", Position::new(0, 6)), 6);
        assert_eq!(to_offset("", Position::new(0, 0)), 0);
    }

    #[test]
    fn later_lines_count_line_breaks() {
        let text = "ab\ncd";
        assert_eq!(to_offset(text, Position::new(0, 2)), 2);
        assert_eq!(to_offset(text, Position::new(1, 0)), 3);
        assert_eq!(to_offset(text, Position::new(1, 2)), 5);
    }

    #[test]
    fn empty_lines_count_one_break_each() {
        let text = "a\n\n\nb";
        assert_eq!(to_offset(text, Position::new(3, 0)), 4);
        assert_eq!(to_offset(text, Position::new(3, 1)), 5);
    }

    #[test]
    fn line_past_end_clamps_to_text_end() {
        assert_eq!(to_offset("ab\ncd", Position::new(7, 0)), 5);
        assert_eq!(to_offset("ab\n", Position::new(9, 9)), 3);
        assert_eq!(to_offset("", Position::new(1, 0)), 0);
    }

    #[test]
    fn column_past_end_clamps_to_line_end() {
        assert_eq!(to_offset("ab\ncd", Position::new(0, 40)), 2);
        assert_eq!(to_offset("ab\ncd", Position::new(1, 40)), 5);
    }

    #[test]
    fn offsets_count_code_units_not_bytes() {
        let text = "héllo\nwörld";
        assert_eq!(to_offset(text, Position::new(0, 2)), 2);
        assert_eq!(to_offset(text, Position::new(1, 2)), 8);
    }

    #[test]
    fn astral_characters_take_two_units() {
        let text = "😀a\nb😀";
        assert_eq!(utf16_len(text), 7);
        assert_eq!(to_offset(text, Position::new(0, 2)), 2);
        assert_eq!(to_offset(text, Position::new(1, 1)), 5);
        assert_eq!(to_offset(text, Position::new(1, 9)), 7);
        assert_eq!(to_position(text, 3), Position::new(0, 3));
        assert_eq!(to_position(text, 4), Position::new(1, 0));
    }

    // ===========================================
    // to_position
    // ===========================================

    #[test]
    fn position_inverts_offset() {
        let text = "ab\nXY\ncd";
        for offset in 0..=utf16_len(text) {
            let pos = to_position(text, offset);
            assert_eq!(to_offset(text, pos), offset, "offset {offset} -> {pos:?}");
        }
    }

    #[test]
    fn offset_at_line_break_stays_on_line() {
        assert_eq!(to_position("ab\ncd", 2), Position::new(0, 2));
        assert_eq!(to_position("ab\ncd", 3), Position::new(1, 0));
    }

    #[test]
    fn offset_past_end_clamps_to_last_position() {
        assert_eq!(to_position("ab\ncd", 99), Position::new(1, 2));
        assert_eq!(to_position("", 4), Position::new(0, 0));
    }

    #[test]
    fn byte_index_handles_multibyte() {
        assert_eq!(byte_index("héllo", 2), 3);
        assert_eq!(byte_index("héllo", 5), 6);
        assert_eq!(byte_index("héllo", 50), 6);
    }

    #[test]
    fn byte_index_handles_surrogate_pairs() {
        assert_eq!(byte_index("😀a", 0), 0);
        assert_eq!(byte_index("😀a", 2), 4);
        assert_eq!(byte_index("😀a", 3), 5);
        // Inside the pair: start of the emoji.
        assert_eq!(byte_index("😀a", 1), 0);
    }
}
