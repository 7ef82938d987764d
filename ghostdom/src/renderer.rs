//! The mutation engine: one synchronous operation per renderer command.
//!
//! [`HeadlessRenderer`] is the single authoritative holder of the current
//! root and the exclusive mutator of the tree. It implements a strict subset
//! of the full renderer contract ([`Renderer`]); every capability outside
//! that subset fails loudly with [`RenderError::Unsupported`] instead of
//! silently no-opping, so callers discover the gap at the call site rather
//! than in silently-wrong output.
//!
//! Every operation either completes with an observable tree mutation or
//! fails leaving the tree byte-for-byte unchanged. No partial mutation is
//! ever applied.

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::debug;
use crate::dom::{Document, NodeId, NodeKind};

/// Callback shape for event subscription requests. Never invoked by this
/// backend; [`Renderer::listen`] always fails.
pub type EventCallback = Box<dyn FnMut(Value)>;

/// Failure modes of the renderer capability surface.
///
/// Modeled as a result type rather than a panic so callers are forced to
/// handle every outcome explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The requested capability is intentionally unimplemented by this
    /// backend. The tree is left unchanged.
    #[error("`{op}` is not supported by the headless renderer")]
    Unsupported {
        /// Name of the rejected operation.
        op: &'static str,
    },

    /// The operation's target node is not of the variant the operation
    /// requires, or a referenced child/parent relationship does not hold.
    /// The tree is left unchanged.
    #[error("invalid target for `{op}`: {reason}")]
    InvalidTarget {
        /// Name of the failing operation.
        op: &'static str,
        /// What went wrong.
        reason: String,
    },
}

impl RenderError {
    fn unsupported(op: &'static str) -> Self {
        RenderError::Unsupported { op }
    }

    fn invalid(op: &'static str, reason: impl Into<String>) -> Self {
        RenderError::InvalidTarget {
            op,
            reason: reason.into(),
        }
    }
}

/// The fixed renderer-abstraction contract a host UI framework dispatches
/// against.
///
/// All operations are synchronous and atomic with respect to the tree: they
/// either complete or fail with [`RenderError`] and no partial effect.
pub trait Renderer {
    /// Create a detached element. Namespaced creation is rejected with
    /// [`RenderError::Unsupported`]; the tree model has no namespace
    /// representation.
    fn create_element(
        &mut self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<NodeId, RenderError>;

    /// Create a detached text node. Never fails.
    fn create_text(&mut self, value: &str) -> Result<NodeId, RenderError>;

    /// Comments are not representable in this tree model; always fails.
    fn create_comment(&mut self, value: &str) -> Result<NodeId, RenderError>;

    /// Append `child` to the end of `parent`'s children. An attached child
    /// is moved.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RenderError>;

    /// Insert `child` immediately before `reference` in `parent`'s
    /// children. A `reference` that is not a child of `parent` is an
    /// [`RenderError::InvalidTarget`] failure.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), RenderError>;

    /// Remove `child` from `parent`'s children, located by identity.
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RenderError>;

    /// Discard the current tree and replace the root with a fresh element
    /// named after `selector`. Always succeeds. The `preserve_content` flag
    /// is accepted for signature compatibility and ignored; the prior tree
    /// is always discarded.
    fn select_root_element(
        &mut self,
        selector: &str,
        preserve_content: bool,
    ) -> Result<NodeId, RenderError>;

    /// This engine keeps no reverse index; always fails.
    fn parent_node(&mut self, node: NodeId) -> Result<NodeId, RenderError>;

    /// This engine keeps no sibling index; always fails.
    fn next_sibling(&mut self, node: NodeId) -> Result<NodeId, RenderError>;

    /// Set a textual attribute on an element. The namespace argument is
    /// accepted and ignored.
    fn set_attribute(
        &mut self,
        el: NodeId,
        name: &str,
        value: &str,
        namespace: Option<&str>,
    ) -> Result<(), RenderError>;

    /// Remove a textual attribute. Removing an absent key is a no-op.
    fn remove_attribute(
        &mut self,
        el: NodeId,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<(), RenderError>;

    /// Styling is outside this model's representational power; always fails.
    fn add_class(&mut self, el: NodeId, name: &str) -> Result<(), RenderError>;

    /// Always fails; see [`Renderer::add_class`].
    fn remove_class(&mut self, el: NodeId, name: &str) -> Result<(), RenderError>;

    /// Always fails; see [`Renderer::add_class`].
    fn set_style(&mut self, el: NodeId, style: &str, value: &str) -> Result<(), RenderError>;

    /// Always fails; see [`Renderer::add_class`].
    fn remove_style(&mut self, el: NodeId, style: &str) -> Result<(), RenderError>;

    /// Set a property on an element. The value is stored as an opaque,
    /// uninterpreted payload.
    fn set_property(&mut self, el: NodeId, name: &str, value: Value) -> Result<(), RenderError>;

    /// Replace the payload of a text node.
    fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), RenderError>;

    /// No event delivery is modeled; always fails.
    fn listen(
        &mut self,
        node: NodeId,
        event: &str,
        callback: EventCallback,
    ) -> Result<(), RenderError>;

    /// Teardown hook. The engine lives for the whole run, so this is a
    /// no-op; there is no per-node destroy callback either.
    fn destroy(&mut self);
}

/// Headless rendering backend keeping an in-memory structural mirror of the
/// host framework's component output.
#[derive(Debug)]
pub struct HeadlessRenderer {
    document: Document,
    data: IndexMap<String, Value>,
}

impl HeadlessRenderer {
    /// Create an engine with a fresh root element named `"root"`.
    pub fn new() -> Self {
        Self {
            document: Document::new("root"),
            data: IndexMap::new(),
        }
    }

    /// The live document tree.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The current root element.
    pub fn root(&self) -> NodeId {
        self.document.root()
    }

    /// Renderer-scoped metadata the host may read freely. Opaque to the
    /// engine.
    pub fn data(&self) -> &IndexMap<String, Value> {
        &self.data
    }

    /// Mutable access to the renderer-scoped metadata map.
    pub fn data_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.data
    }

    fn require_element(&self, id: NodeId, op: &'static str) -> Result<(), RenderError> {
        match self.document.get(id) {
            NodeKind::Element(_) => Ok(()),
            NodeKind::Text(_) => Err(RenderError::invalid(op, "target is a text node")),
        }
    }

    /// Shared validation for the two insertion operations: the parent must
    /// be an element, and attaching `child` must not introduce a cycle or
    /// give the root a parent.
    fn check_insertion(
        &self,
        parent: NodeId,
        child: NodeId,
        op: &'static str,
    ) -> Result<(), RenderError> {
        self.require_element(parent, op)?;
        if child == self.document.root() {
            return Err(RenderError::invalid(op, "cannot attach the root element"));
        }
        if self.document.is_in_subtree(child, parent) {
            return Err(RenderError::invalid(
                op,
                "child is the parent or one of its ancestors",
            ));
        }
        Ok(())
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HeadlessRenderer {
    fn create_element(
        &mut self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<NodeId, RenderError> {
        if namespace.is_some() {
            return Err(RenderError::unsupported("create_element with namespace"));
        }
        Ok(self.document.create_element(name))
    }

    fn create_text(&mut self, value: &str) -> Result<NodeId, RenderError> {
        Ok(self.document.create_text(value))
    }

    fn create_comment(&mut self, _value: &str) -> Result<NodeId, RenderError> {
        Err(RenderError::unsupported("create_comment"))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RenderError> {
        self.check_insertion(parent, child, "append_child")?;
        self.document.append(parent, child);
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), RenderError> {
        self.check_insertion(parent, child, "insert_before")?;
        if self.document.child_position(parent, reference).is_none() {
            return Err(RenderError::invalid(
                "insert_before",
                "reference node is not a child of the parent",
            ));
        }
        self.document.insert_before(reference, child);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RenderError> {
        self.require_element(parent, "remove_child")?;
        if self.document.child_position(parent, child).is_none() {
            return Err(RenderError::invalid(
                "remove_child",
                "node is not a child of the parent",
            ));
        }
        self.document.remove(child);
        Ok(())
    }

    fn select_root_element(
        &mut self,
        selector: &str,
        _preserve_content: bool,
    ) -> Result<NodeId, RenderError> {
        debug!(selector, "replacing root, prior tree becomes unreachable");
        Ok(self.document.replace_root(selector))
    }

    fn parent_node(&mut self, _node: NodeId) -> Result<NodeId, RenderError> {
        Err(RenderError::unsupported("parent_node"))
    }

    fn next_sibling(&mut self, _node: NodeId) -> Result<NodeId, RenderError> {
        Err(RenderError::unsupported("next_sibling"))
    }

    fn set_attribute(
        &mut self,
        el: NodeId,
        name: &str,
        value: &str,
        _namespace: Option<&str>,
    ) -> Result<(), RenderError> {
        match self.document.element_mut(el) {
            Some(elem) => {
                elem.attributes.insert(name.to_owned(), value.to_owned());
                Ok(())
            }
            None => Err(RenderError::invalid("set_attribute", "target is a text node")),
        }
    }

    fn remove_attribute(
        &mut self,
        el: NodeId,
        name: &str,
        _namespace: Option<&str>,
    ) -> Result<(), RenderError> {
        match self.document.element_mut(el) {
            Some(elem) => {
                // shift_remove keeps the remaining keys in insertion order;
                // removing an absent key is a no-op.
                elem.attributes.shift_remove(name);
                Ok(())
            }
            None => Err(RenderError::invalid(
                "remove_attribute",
                "target is a text node",
            )),
        }
    }

    fn add_class(&mut self, _el: NodeId, _name: &str) -> Result<(), RenderError> {
        Err(RenderError::unsupported("add_class"))
    }

    fn remove_class(&mut self, _el: NodeId, _name: &str) -> Result<(), RenderError> {
        Err(RenderError::unsupported("remove_class"))
    }

    fn set_style(&mut self, _el: NodeId, _style: &str, _value: &str) -> Result<(), RenderError> {
        Err(RenderError::unsupported("set_style"))
    }

    fn remove_style(&mut self, _el: NodeId, _style: &str) -> Result<(), RenderError> {
        Err(RenderError::unsupported("remove_style"))
    }

    fn set_property(&mut self, el: NodeId, name: &str, value: Value) -> Result<(), RenderError> {
        match self.document.element_mut(el) {
            Some(elem) => {
                elem.properties.insert(name.to_owned(), value);
                Ok(())
            }
            None => Err(RenderError::invalid("set_property", "target is a text node")),
        }
    }

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), RenderError> {
        match self.document.get_mut(node) {
            NodeKind::Text(payload) => {
                *payload = value.to_owned();
                Ok(())
            }
            NodeKind::Element(_) => Err(RenderError::invalid(
                "set_value",
                "target is an element, not a text node",
            )),
        }
    }

    fn listen(
        &mut self,
        _node: NodeId,
        _event: &str,
        _callback: EventCallback,
    ) -> Result<(), RenderError> {
        Err(RenderError::unsupported("listen"))
    }

    fn destroy(&mut self) {
        debug!("renderer destroy requested; engine lives for the whole run");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attribute_roundtrip() {
        let mut r = HeadlessRenderer::new();
        let div = r.create_element("div", None).unwrap();
        r.set_attribute(div, "id", "x", None).unwrap();
        assert_eq!(
            r.document().element(div).unwrap().attributes.get("id"),
            Some(&"x".to_owned())
        );

        r.remove_attribute(div, "id", None).unwrap();
        assert!(r.document().element(div).unwrap().attributes.is_empty());
        // Removing an absent key is a no-op, not an error.
        r.remove_attribute(div, "id", None).unwrap();
    }

    #[test]
    fn set_value_last_write_wins() {
        let mut r = HeadlessRenderer::new();
        let text = r.create_text("one").unwrap();
        r.set_value(text, "two").unwrap();
        r.set_value(text, "three").unwrap();
        assert_eq!(r.document().text(text), Some("three"));
    }

    #[test]
    fn set_value_rejects_elements() {
        let mut r = HeadlessRenderer::new();
        let div = r.create_element("div", None).unwrap();
        let err = r.set_value(div, "nope").unwrap_err();
        assert!(matches!(err, RenderError::InvalidTarget { op, .. } if op == "set_value"));
    }

    #[test]
    fn namespaced_create_element_is_unsupported() {
        let mut r = HeadlessRenderer::new();
        let err = r
            .create_element("svg", Some("http://www.w3.org/2000/svg"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Unsupported { .. }));
    }

    #[test]
    fn append_child_rejects_text_parent() {
        let mut r = HeadlessRenderer::new();
        let text = r.create_text("hi").unwrap();
        let div = r.create_element("div", None).unwrap();
        let err = r.append_child(text, div).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTarget { .. }));
    }

    #[test]
    fn append_child_rejects_cycles() {
        let mut r = HeadlessRenderer::new();
        let outer = r.create_element("outer", None).unwrap();
        let inner = r.create_element("inner", None).unwrap();
        r.append_child(r.root(), outer).unwrap();
        r.append_child(outer, inner).unwrap();

        assert!(r.append_child(inner, outer).is_err());
        assert!(r.append_child(inner, inner).is_err());
        // The tree kept its shape.
        assert_eq!(r.document().child_position(outer, inner), Some(0));
    }

    #[test]
    fn append_child_rejects_the_root() {
        let mut r = HeadlessRenderer::new();
        let div = r.create_element("div", None).unwrap();
        r.append_child(r.root(), div).unwrap();
        let err = r.append_child(div, r.root()).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTarget { .. }));
    }

    #[test]
    fn insert_before_missing_reference_fails() {
        let mut r = HeadlessRenderer::new();
        let a = r.create_element("a", None).unwrap();
        r.append_child(r.root(), a).unwrap();

        let stray = r.create_element("stray", None).unwrap();
        let b = r.create_element("b", None).unwrap();
        // Pinned policy: a reference that is not a child of the parent is a
        // failure, never a silent append.
        let err = r.insert_before(r.root(), b, stray).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTarget { op, .. } if op == "insert_before"));
        assert_eq!(r.document().child_count(r.root()), 1);
    }

    #[test]
    fn remove_child_missing_child_fails() {
        let mut r = HeadlessRenderer::new();
        let a = r.create_element("a", None).unwrap();
        r.append_child(r.root(), a).unwrap();
        let stray = r.create_element("stray", None).unwrap();

        let err = r.remove_child(r.root(), stray).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTarget { .. }));
        assert_eq!(r.document().child_count(r.root()), 1);
    }

    #[test]
    fn select_root_always_succeeds() {
        let mut r = HeadlessRenderer::new();
        let div = r.create_element("div", None).unwrap();
        r.append_child(r.root(), div).unwrap();

        let new_root = r.select_root_element("app-root", true).unwrap();
        assert_eq!(r.root(), new_root);
        assert_eq!(r.document().element(new_root).unwrap().name, "app-root");
        assert!(!r.document().is_reachable(div));
    }

    #[test]
    fn set_property_stores_opaque_payload() {
        let mut r = HeadlessRenderer::new();
        let div = r.create_element("div", None).unwrap();
        r.set_property(div, "count", json!(3)).unwrap();
        r.set_property(div, "config", json!({"deep": [1, 2]}))
            .unwrap();

        let elem = r.document().element(div).unwrap();
        assert_eq!(elem.properties.get("count"), Some(&json!(3)));
        assert_eq!(elem.properties.get("config"), Some(&json!({"deep": [1, 2]})));
    }

    #[test]
    fn data_map_is_host_scratch_space() {
        let mut r = HeadlessRenderer::new();
        r.data_mut().insert("hydrated".to_owned(), json!(true));
        assert_eq!(r.data().get("hydrated"), Some(&json!(true)));
    }
}
