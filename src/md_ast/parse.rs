//! Token stream to AST.
//!
//! Inline tokens are folded into a tree with an explicit stack of open
//! frames. A formatting marker closes the nearest open frame of its own
//! style, or opens a new one; anything still open at the end of a block stays
//! in the tree with `closed: false` and no closing marker in its `raw`. The
//! stack machine is the intended design for ambiguous-marker pairing; don't
//! replace it with backtracking.

use crate::md_ast::tokenize::{tokenize_with, BlockToken, BlockTokenKind, InlineToken, TokenizeOptions};
use crate::md_ast::{AstNode, FormattingStyle, NodeKind};

/// Parses raw text end to end (tokenize + parse) in rich mode, returning the
/// root node.
pub fn parse_document(text: &str) -> AstNode {
    parse_document_with(text, TokenizeOptions::default())
}

/// Parses raw text end to end with explicit tokenizer options.
pub fn parse_document_with(text: &str, options: TokenizeOptions) -> AstNode {
    parse(tokenize_with(text, options))
}

/// Builds the AST from a block token stream.
pub fn parse(blocks: Vec<BlockToken>) -> AstNode {
    let children: Vec<AstNode> = blocks.into_iter().map(parse_block).collect();
    let raw = {
        let raws: Vec<&str> = children.iter().map(|c| c.raw.as_str()).collect();
        raws.join("\n")
    };
    AstNode::with_raw(NodeKind::Root { children }, raw)
}

fn parse_block(block: BlockToken) -> AstNode {
    match block.kind {
        BlockTokenKind::Paragraph { inline } => AstNode::with_raw(
            NodeKind::Paragraph {
                children: fold_inline(inline),
            },
            block.raw,
        ),
        BlockTokenKind::Quote { inline } => AstNode::with_raw(
            NodeKind::Quote {
                children: fold_inline(inline),
                can_collapse: false,
            },
            block.raw,
        ),
        BlockTokenKind::Pre { language, closed } => AstNode::with_raw(
            NodeKind::Pre {
                value: block.content,
                language,
                closed,
            },
            block.raw,
        ),
    }
}

/// An open container on the parse stack.
enum Frame {
    Formatting {
        style: FormattingStyle,
        children: Vec<AstNode>,
    },
    Link {
        href: String,
        children: Vec<AstNode>,
    },
}

impl Frame {
    fn children_mut(&mut self) -> &mut Vec<AstNode> {
        match self {
            Frame::Formatting { children, .. } | Frame::Link { children, .. } => children,
        }
    }

    fn into_node(self, closed: bool) -> AstNode {
        match self {
            Frame::Formatting { style, children } => AstNode::new(NodeKind::Formatting {
                style,
                children,
                closed,
            }),
            Frame::Link { href, children } => AstNode::new(NodeKind::Link {
                href,
                children,
                closed,
            }),
        }
    }
}

fn fold_inline(tokens: Vec<InlineToken>) -> Vec<AstNode> {
    let mut base: Vec<AstNode> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for token in tokens {
        match token {
            InlineToken::Text { value, raw } => {
                append(&mut stack, &mut base, AstNode::with_raw(NodeKind::Text { value }, raw));
            }
            InlineToken::Monospace { value, raw } => {
                append(
                    &mut stack,
                    &mut base,
                    AstNode::with_raw(NodeKind::Monospace { value }, raw),
                );
            }
            InlineToken::Mention {
                user_id,
                value,
                raw,
            } => {
                append(
                    &mut stack,
                    &mut base,
                    AstNode::with_raw(NodeKind::Mention { user_id, value }, raw),
                );
            }
            InlineToken::CustomEmoji {
                document_id,
                value,
                raw,
            } => {
                append(
                    &mut stack,
                    &mut base,
                    AstNode::with_raw(NodeKind::CustomEmoji { document_id, value }, raw),
                );
            }
            InlineToken::Marker(style) => {
                let open_at = stack.iter().rposition(
                    |frame| matches!(frame, Frame::Formatting { style: s, .. } if *s == style),
                );
                match open_at {
                    Some(index) => close_frame(&mut stack, &mut base, index),
                    None => stack.push(Frame::Formatting {
                        style,
                        children: Vec::new(),
                    }),
                }
            }
            InlineToken::LinkOpen { href } => {
                stack.push(Frame::Link {
                    href,
                    children: Vec::new(),
                });
            }
            InlineToken::LinkClose => {
                let open_at = stack
                    .iter()
                    .rposition(|frame| matches!(frame, Frame::Link { .. }));
                if let Some(index) = open_at {
                    close_frame(&mut stack, &mut base, index);
                }
                // A stray close (no open link on the stack) is dropped; the
                // tokenizer never produces one on its own.
            }
        }
    }

    // End of block: whatever is still open stays unclosed, each frame folding
    // into the one beneath it.
    while let Some(frame) = stack.pop() {
        let node = frame.into_node(false);
        append(&mut stack, &mut base, node);
    }
    base
}

/// Closes the frame at `index`: frames opened after it collapse into it as
/// unclosed children, then the frame itself becomes a closed node.
fn close_frame(stack: &mut Vec<Frame>, base: &mut Vec<AstNode>, index: usize) {
    while stack.len() > index + 1 {
        let inner = stack.pop().unwrap().into_node(false);
        stack.last_mut().unwrap().children_mut().push(inner);
    }
    let node = stack.pop().unwrap().into_node(true);
    append(stack, base, node);
}

fn append(stack: &mut [Frame], base: &mut Vec<AstNode>, node: AstNode) {
    match stack.last_mut() {
        Some(frame) => frame.children_mut().push(node),
        None => base.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::md_ast::tokenize::tokenize;
    use crate::md_ast::{fmt_node, text_node};
    use pretty_assertions::assert_eq;

    fn parse_text(text: &str) -> AstNode {
        parse(tokenize(text))
    }

    fn paragraph_children(root: &AstNode, index: usize) -> &Vec<AstNode> {
        let blocks = root.children().expect("root children");
        blocks[index].children().expect("block children")
    }

    #[test]
    fn scenario_hello_bold_world() {
        let root = parse_text("Hello **bold** world");
        assert_eq!(root.raw, "Hello **bold** world");
        let children = paragraph_children(&root, 0);
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], text_node!("Hello "));
        assert_eq!(
            children[1],
            fmt_node!(Bold, closed: true, [text_node!("bold")])
        );
        assert_eq!(children[2], text_node!(" world"));
    }

    #[test]
    fn empty_text_is_one_empty_paragraph() {
        let root = parse_text("");
        let blocks = root.children().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, NodeKind::Paragraph { children: vec![] });
        assert_eq!(root.raw, "");
    }

    #[test]
    fn unmatched_marker_stays_unclosed() {
        let root = parse_text("**bold");
        let children = paragraph_children(&root, 0);
        assert_eq!(
            children[0],
            fmt_node!(Bold, closed: false, [text_node!("bold")])
        );
        assert_eq!(root.raw, "**bold");
    }

    #[test]
    fn interleaved_markers_collapse_inward() {
        // the italic never closes, so it folds into the bold as unclosed
        let root = parse_text("**a *b** c");
        let children = paragraph_children(&root, 0);
        assert_eq!(children.len(), 2);
        let NodeKind::Formatting {
            style: FormattingStyle::Bold,
            children: bold_children,
            closed: true,
        } = &children[0].kind
        else {
            panic!("expected closed bold, got {:?}", children[0].kind);
        };
        assert_eq!(children[0].raw, "**a *b**");
        assert_eq!(bold_children.len(), 2);
        assert_eq!(
            bold_children[1],
            fmt_node!(Italic, closed: false, [text_node!("b")])
        );
        assert_eq!(children[1], text_node!(" c"));
    }

    #[test]
    fn same_style_does_not_nest() {
        // the middle markers close and reopen rather than nesting
        let root = parse_text("**a** and **b**");
        let children = paragraph_children(&root, 0);
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].raw, "**a**");
        assert_eq!(children[2].raw, "**b**");
    }

    #[test]
    fn bold_italic_shorthand() {
        let root = parse_text("***x***");
        let children = paragraph_children(&root, 0);
        assert_eq!(children.len(), 1);
        let NodeKind::Formatting {
            style: FormattingStyle::Bold,
            children: bold_children,
            closed: true,
        } = &children[0].kind
        else {
            panic!("expected bold");
        };
        assert_eq!(children[0].raw, "***x***");
        let NodeKind::Formatting {
            style: FormattingStyle::Italic,
            closed: true,
            ..
        } = &bold_children[0].kind
        else {
            panic!("expected nested italic");
        };
        assert_eq!(bold_children[0].raw, "*x*");
    }

    #[test]
    fn link_node() {
        let root = parse_text("[label](https://example.com)");
        let children = paragraph_children(&root, 0);
        assert_eq!(
            children[0],
            AstNode::with_raw(
                NodeKind::Link {
                    href: "https://example.com".to_string(),
                    children: vec![AstNode::with_raw(
                        NodeKind::Text {
                            value: "label".to_string()
                        },
                        "label",
                    )],
                    closed: true,
                },
                "[label](https://example.com)",
            )
        );
    }

    #[test]
    fn quote_parses_inline_content() {
        let root = parse_text(">a **b**");
        let blocks = root.children().unwrap();
        let NodeKind::Quote { children, .. } = &blocks[0].kind else {
            panic!("expected quote");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].raw, "**b**");
        assert_eq!(blocks[0].raw, ">a **b**");
    }

    #[test]
    fn pre_content_is_literal() {
        let root = parse_text("```rust\n**not bold**\n```");
        let blocks = root.children().unwrap();
        assert_eq!(
            blocks[0].kind,
            NodeKind::Pre {
                value: "**not bold**".to_string(),
                language: Some("rust".to_string()),
                closed: true,
            }
        );
    }

    #[test]
    fn root_raw_joins_blocks_with_newline() {
        let root = parse_text("a\n>q\nb");
        assert_eq!(root.raw, "a\n>q\nb");
    }

    #[test]
    fn escapes_preserved_in_raws() {
        let root = parse_text(r"**a\*b**");
        let children = paragraph_children(&root, 0);
        assert_eq!(children[0].raw, r"**a\*b**");
        let inner = children[0].children().unwrap();
        assert_eq!(
            inner[0],
            AstNode::with_raw(
                NodeKind::Text {
                    value: "a*b".to_string()
                },
                r"a\*b",
            )
        );
    }
}
