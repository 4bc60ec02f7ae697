//! Locating the most specific node at a logical (markdown-space) offset.
//!
//! This is what "current formatting state at the caret" is built from, and
//! what preview rendering uses to decide which single node shows its syntax
//! characters. Offsets are UTF-16 code units into the root's `raw`, with the
//! implicit `\n` between sibling blocks counting as one unit.

use crate::md_ast::{AstNode, NodeKind};
use crate::util::utf16::Utf16Len;

/// The node found at an offset, with enough context to act on it.
#[derive(Debug)]
pub struct FocusedNode<'a> {
    pub node: &'a AstNode,
    pub parent_node: Option<&'a AstNode>,
    /// Markdown-space offset where `node`'s raw begins.
    pub current_offset: usize,
    /// Inner-content bounds for nodes with marker syntax (pre, monospace,
    /// quote, mention): the region a caret edits "inside" the markers.
    pub content_start: Option<usize>,
    pub content_end: Option<usize>,
}

/// Finds the most specific node containing `offset`, or `None` when the
/// offset is past the end of the document.
pub fn get_focused_node(offset: usize, ast: &AstNode) -> Option<FocusedNode<'_>> {
    match walk(offset, ast, 0, None) {
        Walk::Found(found) => Some(found),
        Walk::Past(_) => None,
    }
}

enum Walk<'a> {
    Found(FocusedNode<'a>),
    /// Node doesn't contain the offset; scanning resumes at this offset.
    Past(usize),
}

fn walk<'a>(
    offset: usize,
    node: &'a AstNode,
    start: usize,
    parent: Option<&'a AstNode>,
) -> Walk<'a> {
    let len = node.raw.utf16_len();
    let end = start + len;

    match &node.kind {
        NodeKind::Root { children } => {
            let mut pos = start;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    pos += 1; // implicit \n between blocks
                }
                match walk(offset, child, pos, Some(node)) {
                    found @ Walk::Found(_) => return found,
                    Walk::Past(past) => pos = past,
                }
            }
            Walk::Past(pos)
        }

        NodeKind::Text { .. } | NodeKind::LineBreak => {
            if offset >= start && offset <= end {
                Walk::Found(found(node, parent, start, None, None))
            } else {
                Walk::Past(end)
            }
        }

        NodeKind::Paragraph { children } => {
            if offset > end {
                return Walk::Past(end);
            }
            match walk_children(offset, children, start, node) {
                found @ Walk::Found(_) => found,
                Walk::Past(_) => Walk::Found(found(node, parent, start, None, None)),
            }
        }

        NodeKind::Quote { children, .. } => {
            if offset > end {
                return Walk::Past(end);
            }
            let content_start = start + 1; // the ">" prefix
            if offset < content_start {
                return Walk::Found(found(node, parent, start, Some(content_start), Some(end)));
            }
            match walk_children(offset, children, content_start, node) {
                found @ Walk::Found(_) => found,
                Walk::Past(_) => {
                    Walk::Found(found(node, parent, start, Some(content_start), Some(end)))
                }
            }
        }

        NodeKind::Pre {
            value, language, ..
        } => {
            if offset > end {
                return Walk::Past(end);
            }
            let mut open_len = 3 + language.as_deref().map_or(0, Utf16Len::utf16_len);
            if language.is_some() || (!value.is_empty() && value != "\n") {
                open_len += 1; // the newline ending the fence line
            }
            let content_start = start + open_len;
            let content_end = content_start + value.utf16_len();
            Walk::Found(found(
                node,
                parent,
                start,
                Some(content_start),
                Some(content_end),
            ))
        }

        NodeKind::Monospace { value } => {
            if offset > end {
                return Walk::Past(end);
            }
            let content_start = start + 1;
            let content_end = content_start + value.utf16_len();
            Walk::Found(found(
                node,
                parent,
                start,
                Some(content_start),
                Some(content_end),
            ))
        }

        NodeKind::Link { children, .. } => {
            if offset > end {
                return Walk::Past(end);
            }
            // Inside the label, the text child is the focus and the link is
            // its parent; anywhere else in the brackets/parens it's the link.
            match walk_children(offset, children, start + 1, node) {
                found @ Walk::Found(_) => found,
                Walk::Past(_) => Walk::Found(found(node, parent, start, None, None)),
            }
        }

        NodeKind::Mention { .. } => {
            if offset > end {
                return Walk::Past(end);
            }
            let label_len = node
                .raw
                .find(']')
                .map_or(0, |idx| node.raw[1..idx].utf16_len());
            let content_start = start + 1;
            let content_end = content_start + label_len;
            Walk::Found(found(
                node,
                parent,
                start,
                Some(content_start),
                Some(content_end),
            ))
        }

        NodeKind::CustomEmoji { .. } => {
            if offset > end {
                Walk::Past(end)
            } else {
                Walk::Found(found(node, parent, start, None, None))
            }
        }

        NodeKind::Formatting {
            style, children, ..
        } => {
            if offset > end {
                return Walk::Past(end);
            }
            // Exactly at the start means the caret sits right before the
            // opening marker; that still counts as this node.
            if offset == start {
                return Walk::Found(found(node, parent, start, None, None));
            }
            let content_start = start + style.open_marker().utf16_len();
            match walk_children(offset, children, content_start, node) {
                found @ Walk::Found(_) => found,
                Walk::Past(_) => Walk::Found(found(node, parent, start, None, None)),
            }
        }
    }
}

fn walk_children<'a>(
    offset: usize,
    children: &'a [AstNode],
    start: usize,
    parent: &'a AstNode,
) -> Walk<'a> {
    let mut pos = start;
    let mut boundary: Option<FocusedNode<'a>> = None;
    for child in children {
        match walk(offset, child, pos, Some(parent)) {
            Walk::Found(hit) => {
                let end = pos + child.raw.utf16_len();
                // A text run's inclusive end coincides with the next
                // sibling's start; the sibling that owns its opening marker
                // takes the boundary, so hold the text hit until the next
                // child has had its chance.
                let trailing_edge =
                    matches!(child.kind, NodeKind::Text { .. } | NodeKind::LineBreak)
                        && offset == end;
                if trailing_edge && boundary.is_none() {
                    boundary = Some(hit);
                    pos = end;
                    continue;
                }
                return Walk::Found(hit);
            }
            Walk::Past(past) => {
                if let Some(hit) = boundary.take() {
                    return Walk::Found(hit);
                }
                pos = past;
            }
        }
    }
    match boundary {
        Some(hit) => Walk::Found(hit),
        None => Walk::Past(pos),
    }
}

fn found<'a>(
    node: &'a AstNode,
    parent: Option<&'a AstNode>,
    start: usize,
    content_start: Option<usize>,
    content_end: Option<usize>,
) -> FocusedNode<'a> {
    FocusedNode {
        node,
        parent_node: parent,
        current_offset: start,
        content_start,
        content_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::md_ast::parse_document;

    #[test]
    fn scenario_trailing_text_node() {
        let root = parse_document("1**2**3");
        let focused = get_focused_node(7, &root).expect("offset 7 is in range");
        assert_eq!(
            focused.node.kind,
            NodeKind::Text {
                value: "3".to_string()
            }
        );
        let parent = focused.parent_node.expect("text has a parent");
        assert!(matches!(parent.kind, NodeKind::Paragraph { .. }));
        assert_eq!(parent.raw, "1**2**3");
        assert_eq!(focused.current_offset, 6);
    }

    #[test]
    fn offset_at_formatting_start_returns_the_node() {
        let root = parse_document("a **b**");
        let focused = get_focused_node(2, &root).unwrap();
        assert_eq!(focused.node.raw, "**b**");
    }

    #[test]
    fn offset_at_monospace_start_returns_the_monospace() {
        let root = parse_document("a `c`");
        let focused = get_focused_node(2, &root).unwrap();
        assert!(matches!(focused.node.kind, NodeKind::Monospace { .. }));
        assert_eq!(focused.current_offset, 2);
    }

    #[test]
    fn trailing_text_end_is_still_the_text() {
        let root = parse_document("**b** x");
        let focused = get_focused_node(7, &root).unwrap();
        assert_eq!(
            focused.node.kind,
            NodeKind::Text {
                value: " x".to_string()
            }
        );
    }

    #[test]
    fn offset_inside_formatting_returns_inner_text() {
        let root = parse_document("a **b**");
        let focused = get_focused_node(5, &root).unwrap();
        assert_eq!(
            focused.node.kind,
            NodeKind::Text {
                value: "b".to_string()
            }
        );
        assert_eq!(focused.parent_node.unwrap().raw, "**b**");
    }

    #[test]
    fn offset_in_closing_marker_returns_formatting_node() {
        let root = parse_document("**b**x");
        let focused = get_focused_node(4, &root).unwrap();
        assert_eq!(focused.node.raw, "**b**");
    }

    #[test]
    fn out_of_range_returns_none() {
        let root = parse_document("ab");
        assert!(get_focused_node(10, &root).is_none());
    }

    #[test]
    fn second_block_offsets_account_for_separator() {
        let root = parse_document("ab\ncd");
        let focused = get_focused_node(4, &root).unwrap();
        assert_eq!(
            focused.node.kind,
            NodeKind::Text {
                value: "cd".to_string()
            }
        );
        assert_eq!(focused.current_offset, 3);
    }

    #[test]
    fn quote_marker_region_returns_quote() {
        let root = parse_document(">hey");
        let focused = get_focused_node(0, &root).unwrap();
        assert!(matches!(focused.node.kind, NodeKind::Quote { .. }));
        assert_eq!(focused.content_start, Some(1));
    }

    #[test]
    fn quote_content_returns_text_child() {
        let root = parse_document(">hey");
        let focused = get_focused_node(3, &root).unwrap();
        assert_eq!(
            focused.node.kind,
            NodeKind::Text {
                value: "hey".to_string()
            }
        );
    }

    #[test]
    fn link_label_returns_text_child_with_link_parent() {
        let root = parse_document("[click](https://example.com)");
        let focused = get_focused_node(3, &root).unwrap();
        assert_eq!(
            focused.node.kind,
            NodeKind::Text {
                value: "click".to_string()
            }
        );
        assert!(matches!(
            focused.parent_node.unwrap().kind,
            NodeKind::Link { .. }
        ));
    }

    #[test]
    fn link_url_region_returns_link() {
        let root = parse_document("[click](https://example.com)");
        let focused = get_focused_node(10, &root).unwrap();
        assert!(matches!(focused.node.kind, NodeKind::Link { .. }));
    }

    #[test]
    fn mention_reports_label_bounds() {
        let root = parse_document("[@user](id:123)");
        let focused = get_focused_node(3, &root).unwrap();
        assert!(matches!(focused.node.kind, NodeKind::Mention { .. }));
        assert_eq!(focused.content_start, Some(1));
        assert_eq!(focused.content_end, Some(6)); // "@user" is 5 units
    }

    #[test]
    fn pre_content_bounds() {
        let root = parse_document("```rust\ncode\n```");
        let focused = get_focused_node(9, &root).unwrap();
        assert!(matches!(focused.node.kind, NodeKind::Pre { .. }));
        assert_eq!(focused.content_start, Some(8));
        assert_eq!(focused.content_end, Some(12));
    }
}
