//! Arena-based document tree.
//!
//! This module provides the node model used by the renderer:
//! - **indextree Arena**: all nodes in contiguous memory, identified by
//!   stable `NodeId` handles rather than native references
//! - **Tagged variants**: every slot is either an `Element` or a `Text` node
//! - **Ordered maps**: attributes and properties preserve insertion order,
//!   which keeps snapshot serialization deterministic
//!
//! Structural lookups are identity-based: two elements may be
//! attribute-for-attribute identical yet occupy distinct tree positions, so
//! children are located by comparing `NodeId`s, never by structural equality.
//! Child position lookup is a linear scan - O(children) per structural
//! operation, which is fine for UI-sized trees.

use indexmap::IndexMap;
use indextree::Arena;
use serde_json::Value;

pub use indextree::NodeId;

/// Identifier of a [`View`] in the document's view table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(usize);

impl ViewId {
    /// Position of the view in the document's view table.
    pub fn index(self) -> usize {
        self.0
    }
}

/// What goes in each arena slot.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// An element with a tag name, attributes, properties and children.
    Element(ElementData),
    /// A text node holding a mutable string payload. No children.
    Text(String),
}

impl NodeKind {
    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element(_))
    }

    /// Returns true if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text(_))
    }
}

/// Element data (name + attributes + properties + view association).
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name, immutable after creation.
    pub name: String,

    /// Textual attributes. IndexMap preserves insertion order for
    /// deterministic serialization.
    pub attributes: IndexMap<String, String>,

    /// Framework-level typed values, stored as opaque payloads. Same shape
    /// as attributes but semantically distinct.
    pub properties: IndexMap<String, Value>,

    /// Weak back-reference to an owning view. Never an ownership path.
    pub view: Option<ViewId>,
}

impl ElementData {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
            view: None,
        }
    }
}

/// An encapsulation boundary distinct from the physical tree.
///
/// A view holds an ordered sequence of nodes it references; the nodes stay
/// owned by the document arena and may simultaneously be reachable from the
/// physical tree.
#[derive(Debug, Clone, Default)]
pub struct View {
    /// Ordered node sequence referenced by this view.
    pub children: Vec<NodeId>,
}

/// Document = arena + current root + view table.
///
/// The root is always an element and has no parent. Detached subtrees stay
/// in the arena as unreachable garbage until the document is dropped; there
/// is no per-node reclamation.
#[derive(Debug, Clone)]
pub struct Document {
    /// THE tree - all nodes live here.
    arena: Arena<NodeKind>,

    /// Current root element.
    root: NodeId,

    /// Views, referenced by `ViewId` from elements.
    views: Vec<View>,
}

impl Document {
    /// Create a document whose root is a fresh element named `root_name`.
    pub fn new(root_name: &str) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeKind::Element(ElementData::new(root_name)));
        Self {
            arena,
            root,
            views: Vec::new(),
        }
    }

    /// The current root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get immutable reference to node data.
    pub fn get(&self, id: NodeId) -> &NodeKind {
        self.arena[id].get()
    }

    /// Get mutable reference to node data.
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeKind {
        self.arena[id].get_mut()
    }

    /// Element data of `id`, or `None` if it is a text node.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.get(id) {
            NodeKind::Element(elem) => Some(elem),
            NodeKind::Text(_) => None,
        }
    }

    /// Mutable element data of `id`, or `None` if it is a text node.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.get_mut(id) {
            NodeKind::Element(elem) => Some(elem),
            NodeKind::Text(_) => None,
        }
    }

    /// Text payload of `id`, or `None` if it is an element.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.get(id) {
            NodeKind::Text(value) => Some(value),
            NodeKind::Element(_) => None,
        }
    }

    /// Create a new detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.arena
            .new_node(NodeKind::Element(ElementData::new(name)))
    }

    /// Create a new detached text node.
    pub fn create_text(&mut self, value: &str) -> NodeId {
        self.arena.new_node(NodeKind::Text(value.to_owned()))
    }

    /// Iterate children of a node in tree order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Number of children of a node.
    pub fn child_count(&self, id: NodeId) -> usize {
        id.children(&self.arena).count()
    }

    /// Identity-based position of `child` in `parent`'s child sequence.
    ///
    /// Linear scan - O(children).
    pub fn child_position(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        parent.children(&self.arena).position(|id| id == child)
    }

    /// True if `descendant` is `ancestor` or lies in its subtree.
    pub fn is_in_subtree(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        descendant.ancestors(&self.arena).any(|id| id == ancestor)
    }

    /// True if `id` is reachable from the current root.
    pub fn is_reachable(&self, id: NodeId) -> bool {
        self.is_in_subtree(self.root, id)
    }

    /// Append `child` to the end of `parent`'s children.
    ///
    /// An already-attached child is detached from its old position first, so
    /// a node is never in two child sequences at once. The caller is
    /// responsible for variant and cycle checks.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        child.detach(&mut self.arena);
        parent.append(child, &mut self.arena);
    }

    /// Insert `child` immediately before `reference` in its parent's
    /// children. Same ownership rules as [`Document::append`]; `reference`
    /// must be attached.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) {
        child.detach(&mut self.arena);
        reference.insert_before(child, &mut self.arena);
    }

    /// Detach `child` from its parent. The subtree below `child` stays
    /// intact but becomes unreachable from the root.
    pub fn remove(&mut self, child: NodeId) {
        child.detach(&mut self.arena);
    }

    /// Discard the current tree and start over with a fresh root element.
    ///
    /// The prior tree stays in the arena as unreachable garbage, so stale
    /// `NodeId` handles never alias nodes of the new tree.
    pub fn replace_root(&mut self, root_name: &str) -> NodeId {
        let root = self.create_element(root_name);
        self.root = root;
        root
    }

    /// Allocate a fresh empty view.
    pub fn new_view(&mut self) -> ViewId {
        self.views.push(View::default());
        ViewId(self.views.len() - 1)
    }

    /// The view behind `id`.
    pub fn view(&self, id: ViewId) -> &View {
        &self.views[id.0]
    }

    /// Associate `element` with `view`. The association is a weak
    /// back-reference only; no-op if `element` is a text node.
    pub fn attach_view(&mut self, element: NodeId, view: ViewId) {
        if let Some(elem) = self.element_mut(element) {
            elem.view = Some(view);
        }
    }

    /// Reference `node` from `view`, preserving insertion order.
    pub fn view_append(&mut self, view: ViewId, node: NodeId) {
        self.views[view.0].children.push(node);
    }
}
