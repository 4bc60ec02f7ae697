//! AST to HTML, with offset-mapping records built during the same walk.
//!
//! HTML offsets count visible text in UTF-16 code units; tags contribute
//! nothing. Sibling blocks are separated by one unit in both spaces (the
//! block boundary in the DOM, the joining `\n` in markdown). When a preview
//! target is given, that one node additionally renders its marker syntax as
//! visible `md-syntax` spans, which do count toward HTML offsets.

use crate::md_ast::{AstNode, FormattingStyle, NodeKind};
use crate::output::offset_map::MappingBuilder;
use crate::output::{RenderError, Rendered};
use crate::util::utf16::Utf16Len;

pub(crate) fn render_html<'a>(
    root: &'a AstNode,
    preview: Option<&'a AstNode>,
) -> Result<Rendered, RenderError> {
    let NodeKind::Root { children } = &root.kind else {
        return Err(RenderError::NotARoot(root.node_type()));
    };
    let mut writer = HtmlWriter {
        out: String::new(),
        map: MappingBuilder::new(),
        preview,
    };
    writer.render_blocks(children)?;
    Ok(Rendered {
        output: writer.out,
        offset_mapping: writer.map.finish(),
    })
}

struct HtmlWriter<'a> {
    out: String,
    map: MappingBuilder,
    preview: Option<&'a AstNode>,
}

impl<'a> HtmlWriter<'a> {
    fn render_blocks(&mut self, blocks: &'a [AstNode]) -> Result<(), RenderError> {
        let mut iter = blocks.iter().peekable();
        while let Some(block) = iter.next() {
            let has_next = iter.peek().is_some();
            let decorate = self.is_preview_target(block);
            match &block.kind {
                NodeKind::Paragraph { children } => self.render_paragraph(block, children),
                NodeKind::Quote { children, .. } => {
                    let index = self.render_quote(block, children, decorate);
                    if has_next {
                        // the separator after a quote line belongs to the
                        // quote's markdown span
                        self.map.extend(index, 0, 1);
                    }
                }
                NodeKind::Pre {
                    value,
                    language,
                    closed,
                } => self.render_pre(block, value, language.as_deref(), *closed, decorate),
                _ => return Err(RenderError::MisplacedNode(block.node_type())),
            }
            if has_next {
                self.map.advance(1, 1);
            }
        }
        Ok(())
    }

    fn render_paragraph(&mut self, node: &'a AstNode, children: &'a [AstNode]) {
        let index = self.map.open(node);
        self.out.push_str("<div class=\"paragraph\">");
        if children.is_empty() {
            self.out.push_str("<br>");
        } else {
            for child in children {
                self.render_inline(child);
            }
        }
        self.out.push_str("</div>");
        self.map.close(index);
    }

    fn render_quote(&mut self, node: &'a AstNode, children: &'a [AstNode], decorate: bool) -> usize {
        let index = self.map.open(node);
        self.out.push_str("<blockquote class=\"quote\">");
        self.marker(">", decorate);
        for child in children {
            self.render_inline(child);
        }
        self.out.push_str("</blockquote>");
        self.map.close(index);
        index
    }

    fn render_pre(
        &mut self,
        node: &'a AstNode,
        value: &str,
        language: Option<&str>,
        closed: bool,
        decorate: bool,
    ) {
        let index = self.map.open(node);
        let mut fence = String::from("```");
        if let Some(lang) = language {
            fence.push_str(lang);
        }
        if language.is_some() || (!value.is_empty() && value != "\n") {
            fence.push('\n');
        }
        self.marker(&fence, decorate);
        self.out.push_str("<pre><code");
        if let Some(lang) = language {
            self.out.push_str(" class=\"language-");
            self.out
                .push_str(&html_escape::encode_double_quoted_attribute(lang));
            self.out.push('"');
        }
        self.out.push('>');
        self.out.push_str(&html_escape::encode_text(value));
        self.out.push_str("</code></pre>");
        self.map.advance(value.utf16_len(), value.utf16_len());
        if closed {
            self.marker("\n```", decorate);
        }
        self.map.close(index);
    }

    fn render_inline(&mut self, node: &'a AstNode) {
        let decorate = self.is_preview_target(node);
        match &node.kind {
            NodeKind::Text { value } => {
                let index = self.map.open(node);
                self.out.push_str(&html_escape::encode_text(value));
                self.map.advance(value.utf16_len(), node.raw.utf16_len());
                self.map.close(index);
            }
            NodeKind::LineBreak => {
                let index = self.map.open(node);
                self.out.push_str("<br>");
                self.map.advance(1, 1);
                self.map.close(index);
            }
            NodeKind::Formatting {
                style,
                children,
                closed,
            } => {
                let index = self.map.open(node);
                self.marker(style.open_marker(), decorate);
                let (open_tag, close_tag) = style_tags(*style);
                self.out.push_str(open_tag);
                for child in children {
                    self.render_inline(child);
                }
                self.out.push_str(close_tag);
                if *closed {
                    self.marker(style.close_marker(), decorate);
                }
                self.map.close(index);
            }
            NodeKind::Monospace { value } => {
                let index = self.map.open(node);
                self.marker("`", decorate);
                self.out.push_str("<code>");
                self.out.push_str(&html_escape::encode_text(value));
                self.out.push_str("</code>");
                self.map.advance(value.utf16_len(), value.utf16_len());
                self.marker("`", decorate);
                self.map.close(index);
            }
            NodeKind::Link {
                href,
                children,
                closed,
            } => {
                let index = self.map.open(node);
                self.marker("[", decorate);
                self.out.push_str("<a href=\"");
                self.out
                    .push_str(&html_escape::encode_double_quoted_attribute(href));
                self.out.push_str("\">");
                for child in children {
                    self.render_inline(child);
                }
                self.out.push_str("</a>");
                if *closed {
                    self.marker(&format!("]({href})"), decorate);
                }
                self.map.close(index);
            }
            NodeKind::Mention { user_id, value } => {
                let index = self.map.open(node);
                self.marker("[", decorate);
                let visible = format!("@{value}");
                self.out.push_str("<a class=\"mention\" data-user-id=\"");
                self.out
                    .push_str(&html_escape::encode_double_quoted_attribute(user_id));
                self.out.push_str("\">");
                self.out.push_str(&html_escape::encode_text(&visible));
                self.out.push_str("</a>");
                self.map.advance(visible.utf16_len(), label_md_len(&node.raw));
                self.marker(&format!("](id:{user_id})"), decorate);
                self.map.close(index);
            }
            NodeKind::CustomEmoji { document_id, value } => {
                let index = self.map.open(node);
                self.marker("[", decorate);
                self.out.push_str("<img class=\"custom-emoji\" data-document-id=\"");
                self.out
                    .push_str(&html_escape::encode_double_quoted_attribute(document_id));
                self.out.push_str("\" alt=\"");
                self.out
                    .push_str(&html_escape::encode_double_quoted_attribute(value));
                self.out.push_str("\">");
                self.map.advance(value.utf16_len(), label_md_len(&node.raw));
                self.marker(&format!("](doc:{document_id})"), decorate);
                self.map.close(index);
            }
            NodeKind::Root { .. }
            | NodeKind::Paragraph { .. }
            | NodeKind::Quote { .. }
            | NodeKind::Pre { .. } => {
                // Recoverable mid-document corruption: drop the node, keep
                // rendering the rest.
                log::error!(
                    "cannot render {} in inline position; skipping node",
                    node.node_type()
                );
            }
        }
    }

    /// Accounts for one piece of marker syntax. Undecorated markers exist
    /// only in markdown space; decorated ones also render as visible text.
    fn marker(&mut self, text: &str, decorate: bool) {
        let len = text.utf16_len();
        if decorate {
            self.out.push_str("<span class=\"md-syntax\">");
            self.out.push_str(&html_escape::encode_text(text));
            self.out.push_str("</span>");
            self.map.advance(len, len);
        } else {
            self.map.advance(0, len);
        }
    }

    fn is_preview_target(&self, node: &AstNode) -> bool {
        self.preview
            .map_or(false, |target| std::ptr::eq(target, node))
    }
}

/// Markdown-space length of the bracketed label in a mention or custom emoji
/// raw (`[label](id:…)`).
fn label_md_len(raw: &str) -> usize {
    raw.find(']').map_or(0, |idx| raw[1..idx].utf16_len())
}

fn style_tags(style: FormattingStyle) -> (&'static str, &'static str) {
    match style {
        FormattingStyle::Bold => ("<strong>", "</strong>"),
        FormattingStyle::Italic => ("<em>", "</em>"),
        FormattingStyle::Underline => ("<span class=\"underline\">", "</span>"),
        FormattingStyle::Strikethrough => ("<s>", "</s>"),
        FormattingStyle::Spoiler => ("<span class=\"spoiler\">", "</span>"),
    }
}
