//! Flat entities to tree.
//!
//! Entities are sorted `(offset asc, length desc)` so that when two start at
//! the same place the longer one becomes the ancestor, then consumed left to
//! right with a cursor; nested entities (strictly contained ranges) convert
//! recursively before their container node is built. Plain runs between
//! entities split into paragraphs on `\n`, except that a newline directly
//! adjacent to a quote/pre block is the block separator and synthesizes
//! nothing.

use crate::api::{ApiFormattedText, ApiMessageEntity, ApiMessageEntityType};
use crate::md_ast::{AstNode, FormattingStyle, NodeKind};
use crate::util::str_utils::normalize_line_endings;
use crate::util::utf16::{utf16_slice, Utf16Len};

/// Converts the wire representation into an AST root.
///
/// Structurally invalid entities (out of range, or overlapping without
/// nesting) are dropped with a warning rather than crashing the conversion.
pub fn from_api_formatted_to_ast(api: &ApiFormattedText) -> AstNode {
    let text = normalize_line_endings(&api.text);
    let entities = validated_entities(&text, &api.entities);
    let blocks = build_blocks(&text, &entities);
    AstNode::new(NodeKind::Root { children: blocks })
}

/// Sorts entities into ancestry order and drops structural violations.
fn validated_entities<'e>(text: &str, entities: &'e [ApiMessageEntity]) -> Vec<&'e ApiMessageEntity> {
    let total = text.utf16_len() as u32;
    let mut sorted: Vec<&ApiMessageEntity> = entities.iter().collect();
    sorted.sort_by(|a, b| a.offset.cmp(&b.offset).then(b.length.cmp(&a.length)));

    let mut accepted: Vec<&ApiMessageEntity> = Vec::with_capacity(sorted.len());
    // Ends of the entities currently containing the cursor, outermost first.
    let mut open_ends: Vec<u32> = Vec::new();
    for entity in sorted {
        if entity.end() > total {
            log::warn!(
                "dropping {} entity [{}, {}): exceeds text length {}",
                entity.kind.wire_name(),
                entity.offset,
                entity.end(),
                total
            );
            continue;
        }
        while matches!(open_ends.last(), Some(&end) if end <= entity.offset) {
            open_ends.pop();
        }
        if let Some(&container_end) = open_ends.last() {
            if entity.end() > container_end {
                log::warn!(
                    "dropping {} entity [{}, {}): partially overlaps an entity ending at {}",
                    entity.kind.wire_name(),
                    entity.offset,
                    entity.end(),
                    container_end
                );
                continue;
            }
        }
        open_ends.push(entity.end());
        accepted.push(entity);
    }
    accepted
}

fn build_blocks(text: &str, entities: &[&ApiMessageEntity]) -> Vec<AstNode> {
    let mut builder = BlockBuilder::new();
    let mut cursor = 0usize;
    let mut i = 0;
    while i < entities.len() {
        let entity = entities[i];
        let start = entity.offset as usize;
        let end = entity.end() as usize;
        builder.process_segment(utf16_slice(text, cursor, start));

        let inner_count = entities[i + 1..]
            .iter()
            .take_while(|e| (e.offset as usize) < end)
            .count();
        let inner = &entities[i + 1..i + 1 + inner_count];

        if is_block_entity(entity.kind) {
            match entity_to_node(text, entity, inner) {
                Some(node) => builder.push_block(node),
                None => builder.process_segment(utf16_slice(text, start, end)),
            }
        } else {
            match entity_to_node(text, entity, inner) {
                Some(node) => builder.push_inline(node),
                None => builder.process_segment(utf16_slice(text, start, end)),
            }
        }

        cursor = end;
        i += 1 + inner_count;
    }
    builder.process_segment(utf16_slice(text, cursor, text.utf16_len()));
    builder.finish()
}

fn is_block_entity(kind: ApiMessageEntityType) -> bool {
    matches!(
        kind,
        ApiMessageEntityType::Blockquote | ApiMessageEntityType::Pre
    )
}

/// Assembles top-level blocks from a stream of plain segments, inline nodes,
/// and block nodes, reproducing the block tokenizer's empty-paragraph
/// placement rules.
struct BlockBuilder {
    blocks: Vec<AstNode>,
    para: Vec<AstNode>,
    para_open: bool,
    after_block: bool,
}

impl BlockBuilder {
    fn new() -> Self {
        BlockBuilder {
            blocks: Vec::new(),
            para: Vec::new(),
            // a paragraph is open from the start, so empty text converts to
            // one empty paragraph
            para_open: true,
            after_block: false,
        }
    }

    fn process_segment(&mut self, segment: &str) {
        let mut segment = segment;
        if self.after_block {
            self.after_block = false;
            if let Some(rest) = segment.strip_prefix('\n') {
                // block separator; consuming it opens the next paragraph
                segment = rest;
                self.para_open = true;
            } else if segment.is_empty() {
                return;
            } else {
                self.para_open = true;
            }
        }
        let mut first = true;
        for piece in segment.split('\n') {
            if !first {
                self.flush_para();
                self.para_open = true;
            }
            first = false;
            if !piece.is_empty() {
                self.para.push(AstNode::new(NodeKind::Text {
                    value: piece.to_string(),
                }));
                self.para_open = true;
            }
        }
    }

    fn push_inline(&mut self, node: AstNode) {
        self.after_block = false;
        self.para.push(node);
        self.para_open = true;
    }

    fn push_block(&mut self, node: AstNode) {
        if !self.para.is_empty() {
            self.flush_para();
        }
        self.para_open = false;
        self.blocks.push(node);
        self.after_block = true;
    }

    fn flush_para(&mut self) {
        let children = std::mem::take(&mut self.para);
        self.blocks
            .push(AstNode::new(NodeKind::Paragraph { children }));
        self.para_open = false;
    }

    fn finish(mut self) -> Vec<AstNode> {
        if self.para_open || !self.para.is_empty() {
            self.flush_para();
        }
        self.blocks
    }
}

/// Builds the node for one entity, converting its nested entities first.
///
/// Returns `None` when the entity must degrade to plain text (unknown type,
/// or a mention/emoji with an empty id, the same rule the tokenizer applies
/// to markup).
fn entity_to_node(
    text: &str,
    entity: &ApiMessageEntity,
    inner: &[&ApiMessageEntity],
) -> Option<AstNode> {
    let start = entity.offset as usize;
    let end = entity.end() as usize;
    let slice = utf16_slice(text, start, end);

    let style = match entity.kind {
        ApiMessageEntityType::Bold => Some(FormattingStyle::Bold),
        ApiMessageEntityType::Italic => Some(FormattingStyle::Italic),
        ApiMessageEntityType::Underline => Some(FormattingStyle::Underline),
        ApiMessageEntityType::Strike => Some(FormattingStyle::Strikethrough),
        ApiMessageEntityType::Spoiler => Some(FormattingStyle::Spoiler),
        _ => None,
    };
    if let Some(style) = style {
        return Some(AstNode::new(NodeKind::Formatting {
            style,
            children: build_inline_nodes(text, inner, start, end),
            closed: true,
        }));
    }

    match entity.kind {
        ApiMessageEntityType::Blockquote => Some(AstNode::new(NodeKind::Quote {
            children: build_inline_nodes(text, inner, start, end),
            can_collapse: entity.can_collapse.unwrap_or(false),
        })),
        ApiMessageEntityType::Pre => Some(AstNode::new(NodeKind::Pre {
            value: slice.to_string(),
            language: entity.language.clone(),
            closed: true,
        })),
        ApiMessageEntityType::Code => Some(AstNode::new(NodeKind::Monospace {
            value: slice.to_string(),
        })),
        ApiMessageEntityType::TextUrl => Some(AstNode::new(NodeKind::Link {
            href: entity.url.clone().unwrap_or_default(),
            children: build_inline_nodes(text, inner, start, end),
            closed: true,
        })),
        ApiMessageEntityType::MentionName => {
            let user_id = entity.user_id.as_deref().unwrap_or_default();
            if user_id.is_empty() {
                return None;
            }
            let value = slice.strip_prefix('@').unwrap_or(slice);
            Some(AstNode::with_raw(
                NodeKind::Mention {
                    user_id: user_id.to_string(),
                    value: value.to_string(),
                },
                format!("[{slice}](id:{user_id})"),
            ))
        }
        ApiMessageEntityType::CustomEmoji => {
            let document_id = entity.document_id.as_deref().unwrap_or_default();
            if document_id.is_empty() {
                return None;
            }
            Some(AstNode::new(NodeKind::CustomEmoji {
                document_id: document_id.to_string(),
                value: slice.to_string(),
            }))
        }
        _ => None,
    }
}

/// Converts the inline region `[start, end)`, turning `\n` in plain runs into
/// line-break nodes.
fn build_inline_nodes(
    text: &str,
    entities: &[&ApiMessageEntity],
    start: usize,
    end: usize,
) -> Vec<AstNode> {
    let mut nodes = Vec::new();
    let mut cursor = start;
    let mut i = 0;
    while i < entities.len() {
        let entity = entities[i];
        let ent_start = entity.offset as usize;
        let ent_end = entity.end() as usize;
        push_text_runs(&mut nodes, utf16_slice(text, cursor, ent_start));

        let inner_count = entities[i + 1..]
            .iter()
            .take_while(|e| (e.offset as usize) < ent_end)
            .count();
        match entity_to_node(text, entity, &entities[i + 1..i + 1 + inner_count]) {
            Some(node) => nodes.push(node),
            None => push_text_runs(&mut nodes, utf16_slice(text, ent_start, ent_end)),
        }
        cursor = ent_end;
        i += 1 + inner_count;
    }
    push_text_runs(&mut nodes, utf16_slice(text, cursor, end));
    nodes
}

fn push_text_runs(nodes: &mut Vec<AstNode>, slice: &str) {
    let mut first = true;
    for piece in slice.split('\n') {
        if !first {
            nodes.push(AstNode::new(NodeKind::LineBreak));
        }
        first = false;
        if !piece.is_empty() {
            nodes.push(AstNode::new(NodeKind::Text {
                value: piece.to_string(),
            }));
        }
    }
}
