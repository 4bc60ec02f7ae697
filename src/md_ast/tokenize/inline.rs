//! Inline scanning: formatting markers, monospace, links, mentions, custom
//! emoji.
//!
//! Patterns are tried in a fixed priority order at the current position;
//! when nothing matches, one character is consumed into the running text
//! buffer and scanning resumes. The scanner never fails: every malformed
//! construct degrades to literal text, which is what keeps mid-keystroke
//! states renderable.

use crate::md_ast::FormattingStyle;

use super::InlineToken;

const ESCAPABLE: &[char] = &['*', '`', '~', '[', ']', '\\'];

/// Inline tokenizer. Cheap to construct; holds only the richness flag.
#[derive(Copy, Clone, Debug)]
pub struct InlineTokenizer {
    is_rich: bool,
}

impl InlineTokenizer {
    pub fn new(is_rich: bool) -> Self {
        InlineTokenizer { is_rich }
    }

    /// Tokenizes one block's content.
    ///
    /// With `is_plain_text` set, the whole content becomes a single literal
    /// text token; used for contexts that must not interpret markup at all.
    pub fn tokenize(&self, content: &str, is_plain_text: bool) -> Vec<InlineToken> {
        if content.is_empty() {
            return Vec::new();
        }
        if is_plain_text {
            return vec![InlineToken::Text {
                value: content.to_string(),
                raw: content.to_string(),
            }];
        }
        let mut scanner = Scanner::new(content, self.is_rich);
        scanner.run();
        scanner.tokens
    }
}

struct Scanner<'a> {
    content: &'a str,
    pos: usize,
    is_rich: bool,
    tokens: Vec<InlineToken>,
    text_value: String,
    text_raw: String,
    open_bold: bool,
    open_italic: bool,
    open_underline: bool,
    open_strikethrough: bool,
    open_spoiler: bool,
}

impl<'a> Scanner<'a> {
    fn new(content: &'a str, is_rich: bool) -> Self {
        Scanner {
            content,
            pos: 0,
            is_rich,
            tokens: Vec::new(),
            text_value: String::new(),
            text_raw: String::new(),
            open_bold: false,
            open_italic: false,
            open_underline: false,
            open_strikethrough: false,
            open_spoiler: false,
        }
    }

    fn run(&mut self) {
        while self.pos < self.content.len() {
            if self.is_rich {
                self.step_rich();
            } else {
                self.step_non_rich();
            }
        }
        self.flush_text();
    }

    fn step_rich(&mut self) {
        let rest = &self.content[self.pos..];

        if let Some(consumed) = try_escape(rest) {
            let escaped = rest[1..].chars().next().unwrap();
            self.text_value.push(escaped);
            self.text_raw.push_str(&rest[..consumed]);
            self.pos += consumed;
            return;
        }

        if rest.starts_with("***") {
            self.flush_text();
            // Combined bold+italic shorthand. When either style is already
            // open this is a close, and close order mirrors open order.
            if self.open_bold || self.open_italic {
                self.emit_marker(FormattingStyle::Italic);
                self.emit_marker(FormattingStyle::Bold);
            } else {
                self.emit_marker(FormattingStyle::Bold);
                self.emit_marker(FormattingStyle::Italic);
            }
            self.pos += 3;
            return;
        }

        if rest.starts_with("**") {
            self.flush_text();
            self.emit_marker(FormattingStyle::Bold);
            self.pos += 2;
            return;
        }

        if rest.starts_with('*') {
            self.flush_text();
            self.emit_marker(FormattingStyle::Italic);
            self.pos += 1;
            return;
        }

        if rest.starts_with("<u>") {
            // Only markup when a counterpart exists later in the content.
            if rest[3..].contains("</u>") {
                self.flush_text();
                self.emit_marker(FormattingStyle::Underline);
            } else {
                self.push_literal("<u>");
            }
            self.pos += 3;
            return;
        }

        if rest.starts_with("</u>") {
            if self.open_underline {
                self.flush_text();
                self.emit_marker(FormattingStyle::Underline);
            } else {
                self.push_literal("</u>");
            }
            self.pos += 4;
            return;
        }

        if rest.starts_with('`') {
            if let Some(close) = rest[1..].find('`').map(|i| i + 1) {
                if close > 1 {
                    self.flush_text();
                    self.tokens.push(InlineToken::Monospace {
                        value: rest[1..close].to_string(),
                        raw: rest[..close + 1].to_string(),
                    });
                    self.pos += close + 1;
                    return;
                }
            }
            self.push_literal("`");
            self.pos += 1;
            return;
        }

        if rest.starts_with('[') {
            if let Some(consumed) = self.try_bracket(rest) {
                self.pos += consumed;
                return;
            }
            self.push_literal("[");
            self.pos += 1;
            return;
        }

        if rest.starts_with("~~") {
            self.flush_text();
            self.emit_marker(FormattingStyle::Strikethrough);
            self.pos += 2;
            return;
        }

        if rest.starts_with("||") {
            self.flush_text();
            self.emit_marker(FormattingStyle::Spoiler);
            self.pos += 2;
            return;
        }

        self.consume_char();
    }

    /// Non-rich contexts only recognize the custom-emoji pattern.
    fn step_non_rich(&mut self) {
        let rest = &self.content[self.pos..];
        if rest.starts_with('[') {
            if let Some((label, target, consumed)) = split_bracket(rest) {
                if let Some(document_id) = target.strip_prefix("doc:") {
                    if !document_id.is_empty() {
                        self.flush_text();
                        self.tokens.push(InlineToken::CustomEmoji {
                            document_id: document_id.to_string(),
                            value: label.to_string(),
                            raw: rest[..consumed].to_string(),
                        });
                        self.pos += consumed;
                        return;
                    }
                }
            }
        }
        self.consume_char();
    }

    /// Handles the `[label](target)` family. Returns the number of bytes
    /// consumed, or `None` when the `[` should degrade to a literal.
    fn try_bracket(&mut self, rest: &str) -> Option<usize> {
        let (label, target, consumed) = split_bracket(rest)?;
        let raw = &rest[..consumed];

        if let Some(user_id) = target.strip_prefix("id:") {
            if user_id.is_empty() {
                // `[name](id:)` stays literal in full.
                self.push_literal(raw);
                return Some(consumed);
            }
            self.flush_text();
            let value = label.strip_prefix('@').unwrap_or(label);
            self.tokens.push(InlineToken::Mention {
                user_id: user_id.to_string(),
                value: value.to_string(),
                raw: raw.to_string(),
            });
            return Some(consumed);
        }

        if let Some(document_id) = target.strip_prefix("doc:") {
            if document_id.is_empty() {
                self.push_literal(raw);
                return Some(consumed);
            }
            self.flush_text();
            self.tokens.push(InlineToken::CustomEmoji {
                document_id: document_id.to_string(),
                value: label.to_string(),
                raw: raw.to_string(),
            });
            return Some(consumed);
        }

        if target.is_empty() {
            self.push_literal(raw);
            return Some(consumed);
        }

        self.flush_text();
        self.tokens.push(InlineToken::LinkOpen {
            href: target.to_string(),
        });
        // The label is tokenized on its own: formatting inside a link label
        // doesn't pair with markers outside it.
        let label_tokens = InlineTokenizer::new(true).tokenize(label, false);
        self.tokens.extend(label_tokens);
        self.tokens.push(InlineToken::LinkClose);
        Some(consumed)
    }

    fn emit_marker(&mut self, style: FormattingStyle) {
        let open = match style {
            FormattingStyle::Bold => &mut self.open_bold,
            FormattingStyle::Italic => &mut self.open_italic,
            FormattingStyle::Underline => &mut self.open_underline,
            FormattingStyle::Strikethrough => &mut self.open_strikethrough,
            FormattingStyle::Spoiler => &mut self.open_spoiler,
        };
        *open = !*open;
        self.tokens.push(InlineToken::Marker(style));
    }

    fn push_literal(&mut self, literal: &str) {
        self.text_value.push_str(literal);
        self.text_raw.push_str(literal);
    }

    fn consume_char(&mut self) {
        let ch = self.content[self.pos..].chars().next().unwrap();
        self.text_value.push(ch);
        self.text_raw.push(ch);
        self.pos += ch.len_utf8();
    }

    fn flush_text(&mut self) {
        if self.text_raw.is_empty() {
            return;
        }
        self.tokens.push(InlineToken::Text {
            value: std::mem::take(&mut self.text_value),
            raw: std::mem::take(&mut self.text_raw),
        });
    }
}

/// Matches `\` + escapable char at the start of `rest`, returning the bytes
/// consumed.
fn try_escape(rest: &str) -> Option<usize> {
    let mut chars = rest.chars();
    if chars.next() != Some('\\') {
        return None;
    }
    let escaped = chars.next()?;
    if ESCAPABLE.contains(&escaped) {
        Some(1 + escaped.len_utf8())
    } else {
        None
    }
}

/// Splits `[label](target)` at the start of `rest` into its parts, returning
/// `(label, target, bytes_consumed)`. `None` when the brackets or parens
/// never terminate.
fn split_bracket(rest: &str) -> Option<(&str, &str, usize)> {
    debug_assert!(rest.starts_with('['));
    let label_end = rest.find(']')?;
    let after_label = &rest[label_end + 1..];
    if !after_label.starts_with('(') {
        return None;
    }
    let target_len = after_label[1..].find(')')?;
    let label = &rest[1..label_end];
    let target = &after_label[1..1 + target_len];
    let consumed = label_end + 1 + 1 + target_len + 1;
    Some((label, target, consumed))
}
