use std::borrow::Cow;

/// Normalizes `\r\n` and bare `\r` to `\n`.
///
/// Every entry point that accepts user-provided text (the tokenizer and the
/// entity converter) runs this first, so the rest of the pipeline only ever
/// sees `\n`.
pub(crate) fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            normalized.push('\n');
        } else {
            normalized.push(ch);
        }
    }
    Cow::Owned(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_carriage_returns_borrows() {
        let text = "hello\nworld";
        assert!(matches!(normalize_line_endings(text), Cow::Borrowed(_)));
    }

    #[test]
    fn crlf_becomes_lf() {
        assert_eq!(normalize_line_endings("a\r\nb"), "a\nb");
    }

    #[test]
    fn bare_cr_becomes_lf() {
        assert_eq!(normalize_line_endings("a\rb\r"), "a\nb\n");
    }

    #[test]
    fn mixed_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }
}
