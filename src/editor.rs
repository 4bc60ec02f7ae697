//! The editor facade: one owned document plus the side tables that make node
//! handles and parent lookups cheap.
//!
//! The tree itself carries no parent pointers and no id registry; this type
//! maintains both as id-keyed maps, rebuilt whenever the document changes.
//! Ids are assigned once per installed tree (not per render), so a caller can
//! hold a [`NodeId`] across renders and still address the same node. All
//! methods are synchronous and touch only this instance; callers mutating one
//! document from several threads must serialize whole edit operations
//! themselves.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::api::{from_api_formatted_to_ast, from_ast_to_api_formatted, ApiFormattedText};
use crate::focus::{get_focused_node, FocusedNode};
use crate::md_ast::{parse_document, AstNode, NodeId, NodeKind};
use crate::output::{
    render, OffsetMappingRecord, RenderError, RenderMode, RenderOptions, RenderOptionsBuilder,
};

#[derive(Debug, PartialEq, Eq)]
pub enum EditorError {
    /// The id isn't in the currently installed tree (stale handle, or the
    /// tree was swapped since the id was obtained).
    UnknownNode(NodeId),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::UnknownNode(id) => write!(f, "no node with id {:?} in this document", id),
        }
    }
}

impl std::error::Error for EditorError {}

pub struct MarkdownEditor {
    ast: AstNode,
    offset_mapping: Vec<OffsetMappingRecord>,
    parents: HashMap<NodeId, NodeId>,
    paths: HashMap<NodeId, Vec<usize>>,
    next_id: u64,
}

impl Default for MarkdownEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownEditor {
    pub fn new() -> Self {
        let mut editor = MarkdownEditor {
            ast: AstNode::with_raw(NodeKind::Root { children: vec![] }, ""),
            offset_mapping: Vec::new(),
            parents: HashMap::new(),
            paths: HashMap::new(),
            next_id: 0,
        };
        editor.set_ast(parse_document(""));
        editor
    }

    /// Parses markdown-dialect text and installs the result as the current
    /// document.
    pub fn parse(&mut self, text: &str) -> &AstNode {
        self.set_ast(parse_document(text))
    }

    /// Converts a wire-format message and installs the result as the current
    /// document.
    pub fn from_api_formatted(&mut self, api: &ApiFormattedText) -> &AstNode {
        self.set_ast(from_api_formatted_to_ast(api))
    }

    /// Installs a tree, assigning every node a fresh id. Ids from the
    /// previously installed tree become stale and are never reused.
    pub fn set_ast(&mut self, mut ast: AstNode) -> &AstNode {
        self.assign_ids(&mut ast);
        self.ast = ast;
        self.offset_mapping.clear();
        self.reindex();
        &self.ast
    }

    pub fn ast(&self) -> &AstNode {
        &self.ast
    }

    /// Renders the current document, replacing the stored offset mapping.
    pub fn render(&mut self, options: &RenderOptions) -> Result<String, RenderError> {
        let rendered = render(&self.ast, options)?;
        self.offset_mapping = rendered.offset_mapping;
        Ok(rendered.output)
    }

    /// The mapping table from the most recent [`MarkdownEditor::render`] (or
    /// [`MarkdownEditor::to_markdown`]) call; empty before the first render.
    pub fn offset_mapping(&self) -> &[OffsetMappingRecord] {
        &self.offset_mapping
    }

    pub fn to_api_formatted(&self) -> ApiFormattedText {
        from_ast_to_api_formatted(&self.ast)
    }

    /// Serializes the current document back to canonical markdown. Like any
    /// render, this overwrites the stored offset mapping.
    pub fn to_markdown(&mut self) -> Result<String, RenderError> {
        let options = RenderOptionsBuilder::default()
            .mode(RenderMode::Markdown)
            .build()
            .unwrap_or_default();
        self.render(&options)
    }

    pub fn focused_node(&self, offset: usize) -> Option<FocusedNode<'_>> {
        get_focused_node(offset, &self.ast)
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&AstNode> {
        let path = self.paths.get(&id)?;
        Some(node_at_path(&self.ast, path))
    }

    pub fn parent_node(&self, id: NodeId) -> Option<&AstNode> {
        let parent_id = *self.parents.get(&id)?;
        self.node_by_id(parent_id)
    }

    /// Replaces the subtree rooted at `id` with `replacement`.
    ///
    /// The replacement's root keeps `id` (the caller's handle stays valid);
    /// its descendants get fresh ids. Ancestor raws are recomputed so the
    /// whole-tree raw invariants keep holding after the splice.
    pub fn replace_node(&mut self, id: NodeId, mut replacement: AstNode) -> Result<(), EditorError> {
        let path = self
            .paths
            .get(&id)
            .cloned()
            .ok_or(EditorError::UnknownNode(id))?;
        self.assign_ids(&mut replacement);
        replacement.id = Some(id);
        *node_at_path_mut(&mut self.ast, &path) = replacement;
        for depth in (0..path.len()).rev() {
            let ancestor = node_at_path_mut(&mut self.ast, &path[..depth]);
            ancestor.raw = ancestor.compute_raw();
        }
        self.offset_mapping.clear();
        self.reindex();
        Ok(())
    }

    fn assign_ids(&mut self, node: &mut AstNode) {
        node.id = Some(NodeId(self.next_id));
        self.next_id += 1;
        if let Some(children) = node.children_mut() {
            for child in children {
                self.assign_ids(child);
            }
        }
    }

    fn reindex(&mut self) {
        self.parents.clear();
        self.paths.clear();
        let mut path = Vec::new();
        index_into(&self.ast, &mut path, &mut self.parents, &mut self.paths);
    }
}

fn index_into(
    node: &AstNode,
    path: &mut Vec<usize>,
    parents: &mut HashMap<NodeId, NodeId>,
    paths: &mut HashMap<NodeId, Vec<usize>>,
) {
    let id = node.id.expect("ids are assigned before indexing");
    paths.insert(id, path.clone());
    if let Some(children) = node.children() {
        for (i, child) in children.iter().enumerate() {
            if let Some(child_id) = child.id {
                parents.insert(child_id, id);
            }
            path.push(i);
            index_into(child, path, parents, paths);
            path.pop();
        }
    }
}

fn node_at_path<'a>(mut node: &'a AstNode, path: &[usize]) -> &'a AstNode {
    for &index in path {
        node = &node.children().expect("indexed path steps into children")[index];
    }
    node
}

fn node_at_path_mut<'a>(mut node: &'a mut AstNode, path: &[usize]) -> &'a mut AstNode {
    for &index in path {
        node = &mut node
            .children_mut()
            .expect("indexed path steps into children")[index];
    }
    node
}
