//! Tokenizing: raw text to block tokens, each carrying its inline tokens.
//!
//! The block scanner and the inline scanner are deliberately separate passes:
//! block structure (paragraph / quote / fenced pre) is decided purely by line
//! starts, while inline markers are matched inside a block's content with no
//! knowledge of block boundaries. [`tokenize`] composes the two.

mod block;
mod inline;

pub use inline::InlineTokenizer;
pub(crate) use block::scan_blocks;

use crate::md_ast::FormattingStyle;
use crate::util::str_utils::normalize_line_endings;

/// Tokenizer configuration.
///
/// Non-rich contexts (media captions, bios) only support custom emoji; every
/// other pattern is left as literal text there.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TokenizeOptions {
    pub is_rich: bool,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        TokenizeOptions { is_rich: true }
    }
}

/// A top-level block token.
///
/// `raw` is the full source slice including block markup; `content` excludes
/// the block-level markup (the `>` prefix, the fences and language tag).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockToken {
    pub raw: String,
    pub content: String,
    pub kind: BlockTokenKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockTokenKind {
    Paragraph { inline: Vec<InlineToken> },
    Quote { inline: Vec<InlineToken> },
    Pre { language: Option<String>, closed: bool },
}

/// An inline token within one block's content.
///
/// Formatting markers ([`InlineToken::Marker`]) don't know whether they open
/// or close anything; the parser's stack resolves that. Links bracket their
/// contents between `LinkOpen`/`LinkClose`; the rest are self-contained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineToken {
    /// A literal text run. `raw` differs from `value` only where escape
    /// sequences were consumed.
    Text { value: String, raw: String },
    Marker(FormattingStyle),
    Monospace { value: String, raw: String },
    LinkOpen { href: String },
    LinkClose,
    Mention {
        user_id: String,
        value: String,
        raw: String,
    },
    CustomEmoji {
        document_id: String,
        value: String,
        raw: String,
    },
}

/// Tokenizes `text` into block tokens with their inline tokens, in rich mode.
pub fn tokenize(text: &str) -> Vec<BlockToken> {
    tokenize_with(text, TokenizeOptions::default())
}

/// Tokenizes with explicit options. Line endings are normalized first, so the
/// resulting raws reference `\n` regardless of the input's convention.
pub fn tokenize_with(text: &str, options: TokenizeOptions) -> Vec<BlockToken> {
    let text = normalize_line_endings(text);
    let inline_tokenizer = InlineTokenizer::new(options.is_rich);
    let mut blocks = scan_blocks(&text);
    for block in &mut blocks {
        match &mut block.kind {
            BlockTokenKind::Paragraph { inline } | BlockTokenKind::Quote { inline } => {
                *inline = inline_tokenizer.tokenize(&block.content, false);
            }
            BlockTokenKind::Pre { .. } => {}
        }
    }
    blocks
}
