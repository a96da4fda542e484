//! # Document Model
//!
//! The input representation for the rendering engine: an ordered tree of
//! typed nodes with string-keyed attributes and inline text content. This is
//! designed to be easily produced by a report generator, an XML loader, or
//! direct JSON construction.
//!
//! Nodes live in an arena owned by [`DocumentTree`] and are addressed by
//! copyable [`NodeId`] handles. The handles are what make the engine's two
//! passes possible: the transform pass inserts and removes siblings while
//! iterating, and the print pass carries a resume handle across page
//! invocations. Neither works with directly-owned child vectors alone.
//!
//! Detaching a node removes it from the document but leaves its data in the
//! arena, so a handle captured before a mutation never dangles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

/// Handle to a node in a [`DocumentTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The different kinds of nodes in the document tree.
///
/// The set is closed for dispatch purposes; element names outside the
/// vocabulary are preserved as [`NodeKind::Other`] and ignored for drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root. Carries the page setup attributes.
    Document,
    /// Cursor movement (`absX`/`absY`/`relX`/`relY`).
    Move,
    /// A rectangle, expanded into four lines by the transform pass.
    Rectangle,
    /// A table, expanded into positioned text and frame lines.
    Table,
    /// The column definition block of a table.
    Columns,
    /// A single column definition. Inline text is the header label.
    Column,
    /// The data block of a table.
    Data,
    /// A table data row.
    Row,
    /// A cell inside a row, matched to a column by position.
    Cell,
    /// A page boundary. Inserted automatically or authored explicitly.
    NewPage,
    /// Drawable text. Inline content, optional `align` and position attrs.
    Text,
    /// A line between two independently resolved points.
    Line,
    /// An ellipse described by center and two radii.
    Circle,
    /// A font change, scoped when the node has children.
    Font,
    /// A pen/fill color change, scoped when the node has children.
    Color,
    /// An element outside the vocabulary. Never drawn, still traversed.
    Other(String),
}

impl NodeKind {
    /// Map an element name to a node kind. `tr`/`td` are accepted as the
    /// classic aliases for rows and cells.
    pub fn from_element_name(name: &str) -> NodeKind {
        match name {
            "move" => NodeKind::Move,
            "rectangle" => NodeKind::Rectangle,
            "table" => NodeKind::Table,
            "columns" => NodeKind::Columns,
            "column" => NodeKind::Column,
            "data" => NodeKind::Data,
            "row" | "tr" => NodeKind::Row,
            "cell" | "td" => NodeKind::Cell,
            "newpage" => NodeKind::NewPage,
            "text" => NodeKind::Text,
            "line" => NodeKind::Line,
            "circle" => NodeKind::Circle,
            "font" => NodeKind::Font,
            "color" => NodeKind::Color,
            other => NodeKind::Other(other.to_string()),
        }
    }

    /// The canonical element name, used in error messages and dumps.
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Move => "move",
            NodeKind::Rectangle => "rectangle",
            NodeKind::Table => "table",
            NodeKind::Columns => "columns",
            NodeKind::Column => "column",
            NodeKind::Data => "data",
            NodeKind::Row => "row",
            NodeKind::Cell => "cell",
            NodeKind::NewPage => "newpage",
            NodeKind::Text => "text",
            NodeKind::Line => "line",
            NodeKind::Circle => "circle",
            NodeKind::Font => "font",
            NodeKind::Color => "color",
            NodeKind::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    attrs: HashMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An ordered tree of document nodes backed by an arena.
///
/// The tree is exclusively owned by the print job that built it. The
/// transform pass mutates it destructively; afterwards the print pass walks
/// it read-only.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    /// Create a tree holding only a document root.
    pub fn new() -> Self {
        let root = NodeData {
            kind: NodeKind::Document,
            attrs: HashMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        };
        DocumentTree {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a detached node of the given kind.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            attrs: HashMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// The element name of a node, for error messages.
    pub fn name(&self, id: NodeId) -> &str {
        self.nodes[id.0].kind.name()
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        self.nodes[id.0].attrs.insert(name.to_string(), value.into());
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.0].text = text.into();
    }

    pub fn push_text(&mut self, id: NodeId, fragment: &str) {
        self.nodes[id.0].text.push_str(fragment);
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.first().copied()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.nodes[id.0].children.is_empty()
    }

    /// The next sibling of `id` in document order, if any.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.0].parent.is_none());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `node` as a sibling immediately before `anchor`.
    ///
    /// The anchor must be attached to a parent. A handle to the anchor's
    /// next sibling captured before this call stays valid.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) {
        let parent = self.nodes[anchor.0]
            .parent
            .expect("insert_before anchor must be attached");
        debug_assert!(self.nodes[node.0].parent.is_none());
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == anchor)
            .expect("anchor must be a child of its parent");
        self.nodes[parent.0].children.insert(pos, node);
        self.nodes[node.0].parent = Some(parent);
    }

    /// Remove `node` from its parent's child list. The node and its subtree
    /// stay in the arena, so handles into it never dangle, but the document
    /// no longer contains it.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    // ── Attribute access with structural validation ─────────────────

    /// A mandatory attribute; absence is a structural error naming the node.
    pub fn required_attr(&self, id: NodeId, name: &str) -> Result<&str> {
        self.attr(id, name).ok_or_else(|| FolioError::MissingAttribute {
            node: self.name(id).to_string(),
            attr: name.to_string(),
        })
    }

    /// A mandatory numeric attribute.
    pub fn required_f64(&self, id: NodeId, name: &str) -> Result<f64> {
        let value = self.required_attr(id, name)?;
        self.parse_f64(id, name, value)
    }

    /// An optional numeric attribute; present-but-unparseable is fatal.
    pub fn optional_f64(&self, id: NodeId, name: &str) -> Result<Option<f64>> {
        match self.attr(id, name) {
            Some(value) => Ok(Some(self.parse_f64(id, name, value)?)),
            None => Ok(None),
        }
    }

    fn parse_f64(&self, id: NodeId, name: &str, value: &str) -> Result<f64> {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| FolioError::InvalidNumber {
                node: self.name(id).to_string(),
                attr: name.to_string(),
                value: value.to_string(),
            })
    }

    // ── Serde input form ────────────────────────────────────────────

    /// Build a tree from the serde-facing recursive form. The top-level
    /// spec becomes the document root regardless of its element name.
    pub fn from_spec(spec: &NodeSpec) -> DocumentTree {
        let mut tree = DocumentTree::new();
        tree.nodes[tree.root.0].attrs = spec.attrs.clone();
        tree.nodes[tree.root.0].text = spec.text.clone();
        for child in &spec.children {
            let id = tree.adopt_spec(child);
            tree.append_child(tree.root, id);
        }
        tree
    }

    /// Parse a JSON document (the [`NodeSpec`] form) into a tree.
    pub fn from_json(json: &str) -> Result<DocumentTree> {
        let spec: NodeSpec = serde_json::from_str(json)?;
        Ok(DocumentTree::from_spec(&spec))
    }

    fn adopt_spec(&mut self, spec: &NodeSpec) -> NodeId {
        let id = self.create(NodeKind::from_element_name(&spec.element));
        self.nodes[id.0].attrs = spec.attrs.clone();
        self.nodes[id.0].text = spec.text.clone();
        for child in &spec.children {
            let child_id = self.adopt_spec(child);
            self.append_child(id, child_id);
        }
        id
    }

    /// Snapshot of (kind, text) pairs in depth-first document order.
    /// Used by tests and the CLI dump; cheap enough to not matter.
    pub fn flatten(&self) -> Vec<(NodeKind, String)> {
        let mut out = Vec::new();
        self.flatten_into(self.root, &mut out);
        out
    }

    fn flatten_into(&self, id: NodeId, out: &mut Vec<(NodeKind, String)>) {
        for &child in self.children(id) {
            out.push((self.kind(child).clone(), self.text(child).to_string()));
            self.flatten_into(child, out);
        }
    }
}

/// The serde-facing recursive document form, for producers that build
/// reports as JSON instead of XML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    /// Element name, e.g. `"move"` or `"table"`.
    #[serde(default)]
    pub element: String,
    /// String-keyed attributes.
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    /// Inline text content.
    #[serde(default)]
    pub text: String,
    /// Ordered child nodes.
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_before_preserves_captured_next_sibling() {
        let mut tree = DocumentTree::new();
        let a = tree.create(NodeKind::Text);
        let b = tree.create(NodeKind::Text);
        tree.append_child(tree.root(), a);
        tree.append_child(tree.root(), b);

        let next = tree.next_sibling(a);
        let inserted = tree.create(NodeKind::NewPage);
        tree.insert_before(a, inserted);

        // The captured handle still points at b, and the new node sits first.
        assert_eq!(next, Some(b));
        assert_eq!(tree.children(tree.root()), &[inserted, a, b]);
    }

    #[test]
    fn test_detach_keeps_subtree_readable() {
        let mut tree = DocumentTree::new();
        let table = tree.create(NodeKind::Table);
        let data = tree.create(NodeKind::Data);
        tree.append_child(tree.root(), table);
        tree.append_child(table, data);

        tree.detach(table);
        assert!(tree.children(tree.root()).is_empty());
        // Detached nodes stay addressable.
        assert_eq!(tree.first_child(table), Some(data));
        assert_eq!(tree.parent(table), None);
    }

    #[test]
    fn test_required_attr_errors_name_the_node() {
        let mut tree = DocumentTree::new();
        let table = tree.create(NodeKind::Table);
        tree.append_child(tree.root(), table);

        let err = tree.required_f64(table, "lineheight").unwrap_err();
        assert!(matches!(
            err,
            FolioError::MissingAttribute { ref node, ref attr }
                if node == "table" && attr == "lineheight"
        ));

        tree.set_attr(table, "lineheight", "tall");
        let err = tree.required_f64(table, "lineheight").unwrap_err();
        assert!(matches!(err, FolioError::InvalidNumber { .. }));
    }

    #[test]
    fn test_from_json_roundtrip() {
        let tree = DocumentTree::from_json(
            r#"{
                "attrs": { "width": "210" },
                "children": [
                    { "element": "text", "text": "Hello" },
                    { "element": "tr", "children": [ { "element": "td" } ] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(tree.attr(tree.root(), "width"), Some("210"));
        let children = tree.children(tree.root()).to_vec();
        assert_eq!(tree.kind(children[0]), &NodeKind::Text);
        assert_eq!(tree.text(children[0]), "Hello");
        assert_eq!(tree.kind(children[1]), &NodeKind::Row);
        assert_eq!(
            tree.kind(tree.first_child(children[1]).unwrap()),
            &NodeKind::Cell
        );
    }
}
