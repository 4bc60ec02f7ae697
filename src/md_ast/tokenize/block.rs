//! Block scanning: paragraph, quote, and fenced-pre boundaries.
//!
//! The scanner guarantees that the block raws, joined by single `\n`
//! separators, reproduce the (normalized) input exactly. That property is
//! what lets the parser synthesize the root `raw` by joining, and it pins
//! down every "where does the empty paragraph go" decision:
//!
//! - a `\n` immediately before the start of a quote/pre block is a pure
//!   separator and produces nothing;
//! - every other `\n` flushes the current paragraph and opens a new one, so
//!   consecutive `\n`s yield explicit empty paragraph tokens;
//! - end of input flushes whatever paragraph is open, which is how a quote
//!   line followed by a lone trailing `\n` grows its trailing empty
//!   paragraph.

use memchr::memchr;

use super::{BlockToken, BlockTokenKind};

const FENCE: &str = "```";

pub(crate) fn scan_blocks(text: &str) -> Vec<BlockToken> {
    let bytes = text.as_bytes();
    let len = text.len();
    let mut blocks = Vec::new();
    let mut pos = 0;
    // A paragraph is considered open from the start, so empty input produces
    // exactly one empty paragraph.
    let mut paragraph_open = true;

    // `pos` is at a line start at the top of each iteration.
    while pos < len {
        if at_block_start(text, pos) {
            // Paragraphs flush at every newline, so an open paragraph here is
            // necessarily empty; the block takes its place.
            paragraph_open = false;
            let block_end = if text[pos..].starts_with(FENCE) {
                scan_pre(text, pos, &mut blocks)
            } else {
                scan_quote(text, pos, &mut blocks)
            };
            pos = block_end;
            if pos < len {
                if bytes[pos] == b'\n' {
                    pos += 1;
                    paragraph_open = !(pos < len && at_block_start(text, pos));
                } else {
                    // Trailing junk on a closing fence line; treat it as the
                    // start of a new paragraph.
                    paragraph_open = true;
                }
            }
            continue;
        }

        let line_end = memchr(b'\n', &bytes[pos..]).map_or(len, |i| pos + i);
        push_paragraph(&mut blocks, &text[pos..line_end]);
        paragraph_open = false;
        if line_end == len {
            break;
        }
        pos = line_end + 1;
        paragraph_open = !(pos < len && at_block_start(text, pos));
    }

    if paragraph_open {
        push_paragraph(&mut blocks, "");
    }
    blocks
}

fn at_block_start(text: &str, pos: usize) -> bool {
    let rest = &text[pos..];
    rest.starts_with('>') || rest.starts_with(FENCE)
}

fn push_paragraph(blocks: &mut Vec<BlockToken>, content: &str) {
    blocks.push(BlockToken {
        raw: content.to_string(),
        content: content.to_string(),
        kind: BlockTokenKind::Paragraph { inline: Vec::new() },
    });
}

/// Scans a quote block: one `>` line. Returns the position just past the
/// content (the terminating `\n` is not consumed).
fn scan_quote(text: &str, pos: usize, blocks: &mut Vec<BlockToken>) -> usize {
    let bytes = text.as_bytes();
    let line_end = memchr(b'\n', &bytes[pos..]).map_or(text.len(), |i| pos + i);
    blocks.push(BlockToken {
        raw: text[pos..line_end].to_string(),
        content: text[pos + 1..line_end].to_string(),
        kind: BlockTokenKind::Quote { inline: Vec::new() },
    });
    line_end
}

/// Scans a fenced pre block starting at `pos` (which is at ```` ``` ````).
/// Returns the position just past the block.
fn scan_pre(text: &str, pos: usize, blocks: &mut Vec<BlockToken>) -> usize {
    let bytes = text.as_bytes();
    let len = text.len();
    let lang_start = pos + FENCE.len();

    let Some(fence_line_end) = memchr(b'\n', &bytes[lang_start..]).map(|i| lang_start + i) else {
        // Fence line with no newline after it: the rest of the line is the
        // language tag and the block is unclosed with empty content.
        blocks.push(BlockToken {
            raw: text[pos..].to_string(),
            content: String::new(),
            kind: BlockTokenKind::Pre {
                language: language_of(&text[lang_start..]),
                closed: false,
            },
        });
        return len;
    };

    let language = language_of(&text[lang_start..fence_line_end]);
    let content_start = fence_line_end + 1;

    // The closing fence must sit at a line start: either immediately at the
    // start of the content region, or right after a newline.
    let closing = if text[content_start..].starts_with(FENCE) {
        Some(content_start)
    } else {
        memchr::memchr_iter(b'\n', &bytes[content_start..])
            .map(|i| content_start + i + 1)
            .find(|&line_start| text[line_start..].starts_with(FENCE))
    };

    match closing {
        Some(fence_pos) => {
            let content_end = if fence_pos == content_start {
                content_start
            } else {
                fence_pos - 1 // exclude the newline before the fence
            };
            let block_end = fence_pos + FENCE.len();
            blocks.push(BlockToken {
                raw: text[pos..block_end].to_string(),
                content: text[content_start..content_end].to_string(),
                kind: BlockTokenKind::Pre {
                    language,
                    closed: true,
                },
            });
            block_end
        }
        None => {
            blocks.push(BlockToken {
                raw: text[pos..].to_string(),
                content: text[content_start..].to_string(),
                kind: BlockTokenKind::Pre {
                    language,
                    closed: false,
                },
            });
            len
        }
    }
}

fn language_of(tag: &str) -> Option<String> {
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(blocks: &[BlockToken]) -> Vec<&'static str> {
        blocks
            .iter()
            .map(|b| match b.kind {
                BlockTokenKind::Paragraph { .. } => "paragraph",
                BlockTokenKind::Quote { .. } => "quote",
                BlockTokenKind::Pre { .. } => "pre",
            })
            .collect()
    }

    fn rejoined(blocks: &[BlockToken]) -> String {
        let raws: Vec<&str> = blocks.iter().map(|b| b.raw.as_str()).collect();
        raws.join("\n")
    }

    #[test]
    fn empty_input_is_one_empty_paragraph() {
        let blocks = scan_blocks("");
        assert_eq!(kinds(&blocks), vec!["paragraph"]);
        assert_eq!(blocks[0].raw, "");
    }

    #[test]
    fn single_paragraph() {
        let blocks = scan_blocks("hello world");
        assert_eq!(kinds(&blocks), vec!["paragraph"]);
        assert_eq!(blocks[0].content, "hello world");
    }

    #[test]
    fn newline_splits_paragraphs() {
        let blocks = scan_blocks("one\ntwo");
        assert_eq!(kinds(&blocks), vec!["paragraph", "paragraph"]);
        assert_eq!(blocks[0].content, "one");
        assert_eq!(blocks[1].content, "two");
    }

    #[test]
    fn double_newline_keeps_explicit_empty_paragraph() {
        let blocks = scan_blocks("one\n\ntwo");
        assert_eq!(kinds(&blocks), vec!["paragraph", "paragraph", "paragraph"]);
        assert_eq!(blocks[1].content, "");
        assert_eq!(rejoined(&blocks), "one\n\ntwo");
    }

    #[test]
    fn trailing_newline_opens_empty_paragraph() {
        let blocks = scan_blocks("one\n");
        assert_eq!(kinds(&blocks), vec!["paragraph", "paragraph"]);
        assert_eq!(rejoined(&blocks), "one\n");
    }

    #[test]
    fn leading_and_trailing_spaces_preserved() {
        let blocks = scan_blocks("  padded  ");
        assert_eq!(blocks[0].content, "  padded  ");
    }

    #[test]
    fn quote_per_line() {
        let blocks = scan_blocks(">one\n>two");
        assert_eq!(kinds(&blocks), vec!["quote", "quote"]);
        assert_eq!(blocks[0].content, "one");
        assert_eq!(blocks[0].raw, ">one");
        assert_eq!(blocks[1].content, "two");
    }

    #[test]
    fn no_empty_paragraph_between_text_and_quote() {
        let blocks = scan_blocks("text\n>quote");
        assert_eq!(kinds(&blocks), vec!["paragraph", "quote"]);
        assert_eq!(rejoined(&blocks), "text\n>quote");
    }

    #[test]
    fn quote_then_blank_line_inserts_trailing_paragraph() {
        let blocks = scan_blocks(">q\n\nafter");
        assert_eq!(kinds(&blocks), vec!["quote", "paragraph", "paragraph"]);
        assert_eq!(blocks[1].content, "");
        assert_eq!(rejoined(&blocks), ">q\n\nafter");
    }

    #[test]
    fn quote_then_trailing_newline() {
        let blocks = scan_blocks(">q\n");
        assert_eq!(kinds(&blocks), vec!["quote", "paragraph"]);
        assert_eq!(rejoined(&blocks), ">q\n");
    }

    #[test]
    fn quote_at_end_of_input_has_no_trailing_paragraph() {
        let blocks = scan_blocks(">q");
        assert_eq!(kinds(&blocks), vec!["quote"]);
    }

    #[test]
    fn closed_pre_with_language() {
        let blocks = scan_blocks("```typescript\nconst x = 42;\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "const x = 42;");
        assert_eq!(
            blocks[0].kind,
            BlockTokenKind::Pre {
                language: Some("typescript".to_string()),
                closed: true,
            }
        );
        assert_eq!(blocks[0].raw, "```typescript\nconst x = 42;\n```");
    }

    #[test]
    fn pre_without_language() {
        let blocks = scan_blocks("```\ncode\n```");
        assert_eq!(
            blocks[0].kind,
            BlockTokenKind::Pre {
                language: None,
                closed: true,
            }
        );
    }

    #[test]
    fn unclosed_pre_absorbs_rest() {
        let blocks = scan_blocks("```js\nlet a;\nmore");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "let a;\nmore");
        assert_eq!(
            blocks[0].kind,
            BlockTokenKind::Pre {
                language: Some("js".to_string()),
                closed: false,
            }
        );
    }

    #[test]
    fn fence_on_content_line_does_not_close() {
        // the ``` here is not at a line start
        let blocks = scan_blocks("```\ncode ```");
        assert_eq!(
            blocks[0].kind,
            BlockTokenKind::Pre {
                language: None,
                closed: false,
            }
        );
        assert_eq!(blocks[0].content, "code ```");
    }

    #[test]
    fn two_backticks_are_plain_text() {
        let blocks = scan_blocks("``not a fence");
        assert_eq!(kinds(&blocks), vec!["paragraph"]);
        assert_eq!(blocks[0].content, "``not a fence");
    }

    #[test]
    fn empty_pre_block() {
        let blocks = scan_blocks("```\n```");
        assert_eq!(blocks[0].content, "");
        assert_eq!(
            blocks[0].kind,
            BlockTokenKind::Pre {
                language: None,
                closed: true,
            }
        );
    }

    #[test]
    fn fence_line_without_newline() {
        let blocks = scan_blocks("```rust");
        assert_eq!(blocks[0].content, "");
        assert_eq!(
            blocks[0].kind,
            BlockTokenKind::Pre {
                language: Some("rust".to_string()),
                closed: false,
            }
        );
    }

    #[test]
    fn pre_between_paragraphs() {
        let blocks = scan_blocks("before\n```\nx\n```\nafter");
        assert_eq!(kinds(&blocks), vec!["paragraph", "pre", "paragraph"]);
        assert_eq!(rejoined(&blocks), "before\n```\nx\n```\nafter");
    }

    #[test]
    fn raws_always_rejoin_to_input() {
        for input in [
            "",
            "a",
            "a\n",
            "\n",
            "\n\n",
            "\na",
            ">q",
            ">q\n",
            ">q\n\n",
            "a\n>q\nb",
            "a\n\n>q",
            "```\nx\n```",
            "```rust\nfn f() {}\n```\n",
            "a\n```\nx\n```\n\nb",
        ] {
            assert_eq!(rejoined(&scan_blocks(input)), input, "input: {input:?}");
        }
    }
}
