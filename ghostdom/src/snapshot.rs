//! Deterministic snapshots of the document tree.
//!
//! Two representations of the same data:
//! - a **structured dump** ([`SnapshotNode`]) that preserves the full node
//!   graph and serializes to JSON for programmatic inspection
//! - a **textual serialization** ([`TreeDump`]) - a tree-shaped,
//!   whitespace-indented rendering for humans
//!
//! Both are deterministic: the same tree produces the same output bytes.
//! Attribute and property iteration order is insertion order (IndexMap),
//! never implementation-defined bucket order.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::dom::{Document, NodeId, NodeKind};

/// Serializable mirror of a document subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    /// An element with its full substructure.
    Element(SnapshotElement),
    /// A text node.
    Text {
        /// The text payload.
        value: String,
    },
}

/// Element node in a structured dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotElement {
    /// Tag name.
    pub name: String,
    /// Attributes in insertion order.
    pub attributes: IndexMap<String, String>,
    /// Properties in insertion order, payloads verbatim.
    pub properties: IndexMap<String, Value>,
    /// Children in tree order.
    pub children: Vec<SnapshotNode>,
    /// Index of the associated view, if any.
    pub view: Option<usize>,
}

/// Capture the structured dump of the tree rooted at the document's current
/// root.
pub fn snapshot(doc: &Document) -> SnapshotNode {
    snapshot_node(doc, doc.root())
}

fn snapshot_node(doc: &Document, id: NodeId) -> SnapshotNode {
    match doc.get(id) {
        NodeKind::Element(elem) => SnapshotNode::Element(SnapshotElement {
            name: elem.name.clone(),
            attributes: elem.attributes.clone(),
            properties: elem.properties.clone(),
            children: doc.children(id).map(|c| snapshot_node(doc, c)).collect(),
            view: elem.view.map(|v| v.index()),
        }),
        NodeKind::Text(value) => SnapshotNode::Text {
            value: value.clone(),
        },
    }
}

/// Serialize the structured dump to pretty-printed JSON.
pub fn to_json_pretty(doc: &Document) -> String {
    serde_json::to_string_pretty(&snapshot(doc)).expect("snapshot serialization should not fail")
}

/// Render the textual tree serialization.
pub fn to_text(doc: &Document) -> String {
    TreeDump { doc }.to_string()
}

/// Helper for pretty-printing a document tree.
///
/// Elements render as `<name attr="value" prop={json}>` lines with their
/// children indented below and a matching closing line; text nodes render as
/// `TEXT: "payload"`.
pub struct TreeDump<'a> {
    doc: &'a Document,
}

impl<'a> TreeDump<'a> {
    /// Dump the tree rooted at the document's current root.
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, node: NodeId, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self.doc.get(node) {
            NodeKind::Element(elem) => {
                write!(f, "{indent}<{}", elem.name)?;
                for (name, value) in &elem.attributes {
                    write!(f, " {name}={value:?}")?;
                }
                for (name, value) in &elem.properties {
                    write!(f, " {name}={value}")?;
                }
                if let Some(view) = elem.view {
                    write!(f, " view=#{}", view.index())?;
                }
                writeln!(f, ">")?;
                for child in self.doc.children(node) {
                    self.fmt_node(f, child, depth + 1)?;
                }
                writeln!(f, "{indent}</{}>", elem.name)?;
            }
            NodeKind::Text(value) => {
                writeln!(f, "{indent}TEXT: {value:?}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for TreeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, self.doc.root(), 0)
    }
}

impl fmt::Debug for TreeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
