//! Tree to flat entities.
//!
//! One depth-first walk accumulates the plain text and a UTF-16 offset
//! counter; each formatting/quote/link node records its entity after its
//! children have been visited, so children's entities precede their parent's
//! in the output. Root blocks are joined by `\n` with the counter advanced by
//! one, except after a `pre`, whose emitted text already carries its own
//! trailing newline.

use crate::api::{ApiFormattedText, ApiMessageEntity, ApiMessageEntityType};
use crate::md_ast::{AstNode, FormattingStyle, NodeKind};
use crate::util::utf16::Utf16Len;

/// Converts an AST (usually a root, but any subtree works) back into the
/// wire representation.
pub fn from_ast_to_api_formatted(node: &AstNode) -> ApiFormattedText {
    let mut walker = Walker {
        text: String::new(),
        offset: 0,
        entities: Vec::new(),
    };
    walker.emit(node, false);
    ApiFormattedText {
        text: walker.text,
        entities: walker.entities,
    }
}

struct Walker {
    text: String,
    offset: usize,
    entities: Vec<ApiMessageEntity>,
}

impl Walker {
    fn emit(&mut self, node: &AstNode, has_next_sibling_block: bool) {
        match &node.kind {
            NodeKind::Root { children } => {
                let mut iter = children.iter().peekable();
                while let Some(block) = iter.next() {
                    let has_next = iter.peek().is_some();
                    self.emit(block, has_next);
                    if has_next && !matches!(block.kind, NodeKind::Pre { .. }) {
                        self.push_str("\n");
                    }
                }
            }
            NodeKind::Paragraph { children } => {
                for child in children {
                    self.emit(child, false);
                }
            }
            NodeKind::Quote {
                children,
                can_collapse,
            } => {
                let start = self.offset;
                for child in children {
                    self.emit(child, false);
                }
                let mut entity = self.entity_for(ApiMessageEntityType::Blockquote, start);
                if *can_collapse {
                    entity.can_collapse = Some(true);
                }
                self.entities.push(entity);
            }
            NodeKind::Pre {
                value, language, ..
            } => {
                let start = self.offset;
                self.push_str(value);
                let mut entity = self.entity_for(ApiMessageEntityType::Pre, start);
                entity.language = language.clone();
                self.entities.push(entity);
                // the block joiner after a pre is owned by the pre itself
                if has_next_sibling_block {
                    self.push_str("\n");
                }
            }
            NodeKind::Text { value } => self.push_str(value),
            NodeKind::Formatting {
                style, children, ..
            } => {
                let start = self.offset;
                for child in children {
                    self.emit(child, false);
                }
                let kind = match style {
                    FormattingStyle::Bold => ApiMessageEntityType::Bold,
                    FormattingStyle::Italic => ApiMessageEntityType::Italic,
                    FormattingStyle::Underline => ApiMessageEntityType::Underline,
                    FormattingStyle::Strikethrough => ApiMessageEntityType::Strike,
                    FormattingStyle::Spoiler => ApiMessageEntityType::Spoiler,
                };
                let entity = self.entity_for(kind, start);
                self.entities.push(entity);
            }
            NodeKind::Monospace { value } => {
                let start = self.offset;
                self.push_str(value);
                let entity = self.entity_for(ApiMessageEntityType::Code, start);
                self.entities.push(entity);
            }
            NodeKind::Link { href, children, .. } => {
                let start = self.offset;
                for child in children {
                    self.emit(child, false);
                }
                let mut entity = self.entity_for(ApiMessageEntityType::TextUrl, start);
                entity.url = Some(href.clone());
                self.entities.push(entity);
            }
            NodeKind::Mention { user_id, value } => {
                let start = self.offset;
                self.push_str("@");
                self.push_str(value);
                let mut entity = self.entity_for(ApiMessageEntityType::MentionName, start);
                entity.user_id = Some(user_id.clone());
                self.entities.push(entity);
            }
            NodeKind::CustomEmoji { document_id, value } => {
                let start = self.offset;
                self.push_str(value);
                let mut entity = self.entity_for(ApiMessageEntityType::CustomEmoji, start);
                entity.document_id = Some(document_id.clone());
                self.entities.push(entity);
            }
            NodeKind::LineBreak => self.push_str("\n"),
        }
    }

    fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
        self.offset += s.utf16_len();
    }

    fn entity_for(&self, kind: ApiMessageEntityType, start: usize) -> ApiMessageEntity {
        ApiMessageEntity::new(kind, start as u32, (self.offset - start) as u32)
    }
}
