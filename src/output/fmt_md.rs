//! AST back to canonical markdown.
//!
//! Everything the markdown mode emits is visible, so the two mapping cursors
//! advance in lockstep. Unclosed nodes re-emit without their closing marker,
//! preserving mid-typing state, which is what makes parse-render-parse a
//! fixed point.

use crate::md_ast::{AstNode, NodeKind};
use crate::output::offset_map::MappingBuilder;
use crate::output::{RenderError, Rendered};
use crate::util::utf16::Utf16Len;

pub(crate) fn render_markdown(root: &AstNode) -> Result<Rendered, RenderError> {
    let NodeKind::Root { children } = &root.kind else {
        return Err(RenderError::NotARoot(root.node_type()));
    };
    let mut writer = MdWriter {
        out: String::new(),
        map: MappingBuilder::new(),
    };
    writer.render_blocks(children)?;
    Ok(Rendered {
        output: writer.out,
        offset_mapping: writer.map.finish(),
    })
}

struct MdWriter {
    out: String,
    map: MappingBuilder,
}

impl MdWriter {
    fn render_blocks(&mut self, blocks: &[AstNode]) -> Result<(), RenderError> {
        let mut iter = blocks.iter().peekable();
        while let Some(block) = iter.next() {
            let has_next = iter.peek().is_some();
            match &block.kind {
                NodeKind::Paragraph { children } => {
                    let index = self.map.open(block);
                    for child in children {
                        self.render_inline(child);
                    }
                    self.map.close(index);
                }
                NodeKind::Quote { children, .. } => {
                    let index = self.map.open(block);
                    self.push(">");
                    for child in children {
                        self.render_inline(child);
                    }
                    self.map.close(index);
                    if has_next {
                        self.map.extend(index, 1, 1);
                    }
                }
                NodeKind::Pre {
                    value,
                    language,
                    closed,
                } => {
                    let index = self.map.open(block);
                    self.push("```");
                    if let Some(lang) = language {
                        self.push(lang);
                    }
                    if language.is_some() || (!value.is_empty() && value != "\n") {
                        self.push("\n");
                    }
                    self.push(value);
                    if *closed {
                        self.push("\n```");
                    }
                    self.map.close(index);
                }
                _ => return Err(RenderError::MisplacedNode(block.node_type())),
            }
            if has_next {
                self.push("\n");
            }
        }
        Ok(())
    }

    fn render_inline(&mut self, node: &AstNode) {
        match &node.kind {
            // raw, not value: escapes survive re-serialization
            NodeKind::Text { .. } => {
                let index = self.map.open(node);
                self.push(&node.raw);
                self.map.close(index);
            }
            NodeKind::LineBreak => {
                let index = self.map.open(node);
                self.push("\n");
                self.map.close(index);
            }
            NodeKind::Formatting {
                style,
                children,
                closed,
            } => {
                let index = self.map.open(node);
                self.push(style.open_marker());
                for child in children {
                    self.render_inline(child);
                }
                if *closed {
                    self.push(style.close_marker());
                }
                self.map.close(index);
            }
            NodeKind::Monospace { value } => {
                let index = self.map.open(node);
                self.push("`");
                self.push(value);
                self.push("`");
                self.map.close(index);
            }
            NodeKind::Link {
                href,
                children,
                closed,
            } => {
                let index = self.map.open(node);
                self.push("[");
                for child in children {
                    self.render_inline(child);
                }
                if *closed {
                    self.push(&format!("]({href})"));
                }
                self.map.close(index);
            }
            NodeKind::Mention { .. } | NodeKind::CustomEmoji { .. } => {
                let index = self.map.open(node);
                self.push(&node.raw);
                self.map.close(index);
            }
            NodeKind::Root { .. }
            | NodeKind::Paragraph { .. }
            | NodeKind::Quote { .. }
            | NodeKind::Pre { .. } => {
                log::error!(
                    "cannot render {} in inline position; skipping node",
                    node.node_type()
                );
            }
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
        let len = text.utf16_len();
        self.map.advance(len, len);
    }
}
