use std::fmt::{Display, Formatter};

/// Stable handle for a node within one [`crate::editor::MarkdownEditor`] session.
///
/// Ids are assigned by the editor facade when an AST is installed via
/// `set_ast`, never by the parser or the entity converter. They stay valid
/// until the next `set_ast`, which makes them usable as correlation keys in
/// offset-mapping records and as targets for `replace_node`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

/// One node of the formatted-text tree.
///
/// Every node carries `raw`: the markdown-dialect source text it renders from
/// and to. For container nodes, `raw` is always the opening marker plus the
/// concatenated children raws plus the closing marker (the closing marker is
/// omitted while `closed` is `false`, i.e. mid-typing). The root's `raw` is
/// its blocks' raws joined by `\n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AstNode {
    pub id: Option<NodeId>,
    pub raw: String,
    pub kind: NodeKind,
}

/// The per-variant payload of an [`AstNode`].
///
/// This is a single flat sum covering root, block, and inline positions. The
/// parser and converter only ever produce well-placed kinds (blocks under the
/// root, inlines under blocks), but the type deliberately does not enforce
/// that: the renderer treats a block kind found in an inline position as a
/// recoverable corruption rather than making it unrepresentable, mirroring
/// the error-handling contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root {
        children: Vec<AstNode>,
    },
    Paragraph {
        children: Vec<AstNode>,
    },
    Quote {
        children: Vec<AstNode>,
        /// Wire-format `canCollapse`; round-tripped, never set by the markdown parser.
        can_collapse: bool,
    },
    Pre {
        value: String,
        language: Option<String>,
        closed: bool,
    },
    Text {
        value: String,
    },
    Formatting {
        style: FormattingStyle,
        children: Vec<AstNode>,
        closed: bool,
    },
    Monospace {
        value: String,
    },
    Link {
        href: String,
        children: Vec<AstNode>,
        closed: bool,
    },
    Mention {
        user_id: String,
        /// Display name with the leading `@` stripped.
        value: String,
    },
    CustomEmoji {
        document_id: String,
        value: String,
    },
    LineBreak,
}

/// Paired-marker formatting styles whose open/close resolution happens in the
/// parser's stack machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FormattingStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
}

impl FormattingStyle {
    pub fn open_marker(self) -> &'static str {
        match self {
            FormattingStyle::Bold => "**",
            FormattingStyle::Italic => "*",
            FormattingStyle::Underline => "<u>",
            FormattingStyle::Strikethrough => "~~",
            FormattingStyle::Spoiler => "||",
        }
    }

    pub fn close_marker(self) -> &'static str {
        match self {
            FormattingStyle::Underline => "</u>",
            other => other.open_marker(),
        }
    }
}

/// Flat discriminant of [`NodeKind`], used in offset-mapping records and
/// diagnostics where only the node's type matters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Paragraph,
    Quote,
    Pre,
    Text,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Monospace,
    Link,
    Mention,
    CustomEmoji,
    LineBreak,
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeType::Root => "root",
            NodeType::Paragraph => "paragraph",
            NodeType::Quote => "quote",
            NodeType::Pre => "pre",
            NodeType::Text => "text",
            NodeType::Bold => "bold",
            NodeType::Italic => "italic",
            NodeType::Underline => "underline",
            NodeType::Strikethrough => "strikethrough",
            NodeType::Spoiler => "spoiler",
            NodeType::Monospace => "monospace",
            NodeType::Link => "link",
            NodeType::Mention => "mention",
            NodeType::CustomEmoji => "custom-emoji",
            NodeType::LineBreak => "line-break",
        };
        f.write_str(name)
    }
}

impl AstNode {
    /// Builds a node with no id, computing `raw` from the kind's structure.
    ///
    /// The tokenizing parser prefers exact source slices for `raw` (they can
    /// differ from the canonical form around escapes and degenerate fences);
    /// this constructor is for code that builds nodes from structure alone,
    /// such as the entity converter and `replace_node` raw recomputation.
    pub fn new(kind: NodeKind) -> Self {
        let mut node = AstNode {
            id: None,
            raw: String::new(),
            kind,
        };
        node.raw = node.compute_raw();
        node
    }

    /// Builds a node with an explicit `raw` (an exact source slice).
    pub fn with_raw(kind: NodeKind, raw: impl Into<String>) -> Self {
        AstNode {
            id: None,
            raw: raw.into(),
            kind,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Root { .. } => NodeType::Root,
            NodeKind::Paragraph { .. } => NodeType::Paragraph,
            NodeKind::Quote { .. } => NodeType::Quote,
            NodeKind::Pre { .. } => NodeType::Pre,
            NodeKind::Text { .. } => NodeType::Text,
            NodeKind::Formatting { style, .. } => match style {
                FormattingStyle::Bold => NodeType::Bold,
                FormattingStyle::Italic => NodeType::Italic,
                FormattingStyle::Underline => NodeType::Underline,
                FormattingStyle::Strikethrough => NodeType::Strikethrough,
                FormattingStyle::Spoiler => NodeType::Spoiler,
            },
            NodeKind::Monospace { .. } => NodeType::Monospace,
            NodeKind::Link { .. } => NodeType::Link,
            NodeKind::Mention { .. } => NodeType::Mention,
            NodeKind::CustomEmoji { .. } => NodeType::CustomEmoji,
            NodeKind::LineBreak => NodeType::LineBreak,
        }
    }

    pub fn children(&self) -> Option<&Vec<AstNode>> {
        match &self.kind {
            NodeKind::Root { children }
            | NodeKind::Paragraph { children }
            | NodeKind::Quote { children, .. }
            | NodeKind::Formatting { children, .. }
            | NodeKind::Link { children, .. } => Some(children),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<AstNode>> {
        match &mut self.kind {
            NodeKind::Root { children }
            | NodeKind::Paragraph { children }
            | NodeKind::Quote { children, .. }
            | NodeKind::Formatting { children, .. }
            | NodeKind::Link { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Canonical `raw` for this node, derived from its structure and its
    /// children's current raws. Used when a subtree is replaced and the
    /// ancestor chain's raws have to be brought back in sync.
    pub(crate) fn compute_raw(&self) -> String {
        match &self.kind {
            NodeKind::Root { children } => {
                let raws: Vec<&str> = children.iter().map(|c| c.raw.as_str()).collect();
                raws.join("\n")
            }
            NodeKind::Paragraph { children } => children_raw(children),
            NodeKind::Quote { children, .. } => format!(">{}", children_raw(children)),
            NodeKind::Pre {
                value,
                language,
                closed,
            } => {
                let mut raw = String::from("```");
                if let Some(language) = language {
                    raw.push_str(language);
                }
                // Same conditional newline the markdown renderer uses: skip it
                // for an empty or lone-"\n" body with no language tag.
                if language.is_some() || (!value.is_empty() && value != "\n") {
                    raw.push('\n');
                }
                raw.push_str(value);
                if *closed {
                    raw.push_str("\n```");
                }
                raw
            }
            NodeKind::Text { value } => value.clone(),
            NodeKind::Formatting {
                style,
                children,
                closed,
            } => {
                let mut raw = String::from(style.open_marker());
                raw.push_str(&children_raw(children));
                if *closed {
                    raw.push_str(style.close_marker());
                }
                raw
            }
            NodeKind::Monospace { value } => format!("`{value}`"),
            NodeKind::Link {
                href,
                children,
                closed,
            } => {
                if *closed {
                    format!("[{}]({})", children_raw(children), href)
                } else {
                    format!("[{}", children_raw(children))
                }
            }
            NodeKind::Mention { user_id, value } => format!("[@{value}](id:{user_id})"),
            NodeKind::CustomEmoji { document_id, value } => {
                format!("[{value}](doc:{document_id})")
            }
            NodeKind::LineBreak => "\n".to_string(),
        }
    }
}

fn children_raw(children: &[AstNode]) -> String {
    children.iter().map(|c| c.raw.as_str()).collect()
}
