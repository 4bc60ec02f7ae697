//! Rendering the tree to HTML or markdown, plus the offset-mapping table the
//! render produces as a side product.

use std::fmt::{Display, Formatter};

use derive_builder::Builder;

use crate::focus::get_focused_node;
use crate::md_ast::{AstNode, NodeKind, NodeType};

mod fmt_html;
mod fmt_md;
pub mod offset_map;

pub use offset_map::{html_to_md_offset, md_to_html_offset, OffsetMappingRecord};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    #[default]
    Html,
    Markdown,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Builder)]
#[builder(default)]
pub struct RenderOptions {
    pub mode: RenderMode,
    /// Render markdown syntax characters as visible decorated spans on the
    /// node focused by `preview_node_offset`. Only meaningful in HTML mode.
    pub is_preview: bool,
    /// Markdown-space offset resolved through [`get_focused_node`] to pick
    /// the one node that shows its syntax decorations.
    pub preview_node_offset: Option<usize>,
}

/// A render's two outputs: the string and the mapping table correlating its
/// offsets back to markdown-space offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub output: String,
    pub offset_mapping: Vec<OffsetMappingRecord>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RenderError {
    /// `render` was handed something other than a root node.
    NotARoot(NodeType),
    /// A non-block node sat directly under the root. Block nodes in inline
    /// positions are the recoverable case and only log; this one is fatal
    /// because the document shape itself is wrong.
    MisplacedNode(NodeType),
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::NotARoot(node_type) => {
                write!(f, "expected a root node, got {node_type}")
            }
            RenderError::MisplacedNode(node_type) => {
                write!(f, "{node_type} node cannot appear directly under the root")
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Renders a root node in the requested mode.
pub fn render(ast: &AstNode, options: &RenderOptions) -> Result<Rendered, RenderError> {
    match options.mode {
        RenderMode::Markdown => fmt_md::render_markdown(ast),
        RenderMode::Html => {
            let preview = if options.is_preview {
                options
                    .preview_node_offset
                    .and_then(|offset| preview_target(ast, offset))
            } else {
                None
            };
            fmt_html::render_html(ast, preview)
        }
    }
}

/// The node that gets preview decoration: the focused node itself, except
/// that a focused text run decorates its enclosing container instead (text
/// has no syntax of its own).
fn preview_target(ast: &AstNode, offset: usize) -> Option<&AstNode> {
    let focused = get_focused_node(offset, ast)?;
    match focused.node.kind {
        NodeKind::Text { .. } => focused.parent_node,
        _ => Some(focused.node),
    }
}
