//! UTF-16 offset arithmetic.
//!
//! The wire format measures entity offsets and lengths in UTF-16 code units
//! of the message text, and the rendered-offset mapping uses the same unit so
//! that caret positions reported by a DOM layer line up without conversion.
//! Internally we hold `String`s, so these helpers bridge the two.

/// UTF-16 code-unit length of a string slice.
pub(crate) trait Utf16Len {
    fn utf16_len(&self) -> usize;
}

impl Utf16Len for str {
    fn utf16_len(&self) -> usize {
        self.chars().map(char::len_utf16).sum()
    }
}

/// Converts a UTF-16 code-unit offset to a byte index into `text`.
///
/// Offsets past the end of the string clamp to `text.len()`. An offset that
/// lands in the middle of a surrogate pair rounds down to the start of that
/// character.
pub(crate) fn utf16_to_byte_index(text: &str, utf16_offset: usize) -> usize {
    if utf16_offset == 0 {
        return 0;
    }
    let mut units = 0;
    for (byte_idx, ch) in text.char_indices() {
        if units >= utf16_offset {
            return byte_idx;
        }
        units += ch.len_utf16();
    }
    text.len()
}

/// Slices `text` by UTF-16 code-unit offsets.
pub(crate) fn utf16_slice(text: &str, start: usize, end: usize) -> &str {
    let start_byte = utf16_to_byte_index(text, start);
    let end_byte = utf16_to_byte_index(text, end);
    &text[start_byte..end_byte.max(start_byte)]
}
