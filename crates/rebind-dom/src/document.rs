#![forbid(unsafe_code)]

//! The host-document capability set.
//!
//! A reactive binding only ever clears a node and appends to it. View
//! materialization additionally creates elements and text, sets attributes,
//! and registers listeners. Everything is expressed over opaque [`NodeId`]
//! handles so a host can map them onto whatever node representation it owns.
//!
//! # Invariants
//!
//! 1. A node has at most one parent. Appending a node that already has a
//!    parent moves it.
//! 2. A node can never become its own ancestor.
//! 3. `remove_children` leaves the node with zero children.

use std::cell::RefCell;
use std::rc::Rc;

use crate::event::Listener;

slotmap::new_key_type! {
    /// Handle to a node owned by a [`Document`].
    pub struct NodeId;
}

/// Errors from document operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The node handle does not refer to a live node.
    NodeNotFound(NodeId),
    /// The operation would make a node its own ancestor.
    HierarchyRequest { parent: NodeId, child: NodeId },
    /// Text nodes cannot have children, attributes, or listeners.
    NotAnElement(NodeId),
}

impl std::fmt::Display for DomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node {id:?} does not exist"),
            Self::HierarchyRequest { parent, child } => {
                write!(f, "cannot append {child:?} into its descendant {parent:?}")
            }
            Self::NotAnElement(id) => write!(f, "node {id:?} is not an element"),
        }
    }
}

impl std::error::Error for DomError {}

/// Operations a host document exposes to bindings and view materialization.
pub trait Document {
    /// Create a detached element node.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> NodeId;

    /// Set (or overwrite) an attribute on an element.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    /// Register a listener for `event` on an element.
    fn add_listener(&mut self, node: NodeId, event: &str, listener: Listener)
    -> Result<(), DomError>;

    /// Append `child` as the last child of `parent`, detaching it from its
    /// previous parent first.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

    /// Remove every child of `node`.
    fn remove_children(&mut self, node: NodeId) -> Result<(), DomError>;

    /// Children of `node` in document order.
    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DomError>;

    /// Parent of `node`, if attached.
    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError>;

    /// Listeners registered on `node` for `event`, in registration order.
    fn listeners(&self, node: NodeId, event: &str) -> Result<Vec<Listener>, DomError>;

    /// Mark `node` as owned by someone outside the tree, so it survives being
    /// detached by `remove_children` on an ancestor.
    ///
    /// Hosts with their own garbage collection can ignore this.
    fn retain_node(&mut self, _node: NodeId) {}

    /// Undo [`Document::retain_node`]. A detached `node` is freed with its
    /// subtree; an attached one is freed by the next clear of an ancestor.
    fn release_node(&mut self, _node: NodeId) {}
}

/// A document shared between bindings, listeners, and the host loop.
pub type SharedDocument = Rc<RefCell<dyn Document>>;

/// Wrap a concrete document for sharing.
///
/// Keep the returned `Rc<RefCell<D>>` to inspect the concrete type; coerce a
/// clone to [`SharedDocument`] for bindings.
pub fn shared<D: Document + 'static>(doc: D) -> Rc<RefCell<D>> {
    Rc::new(RefCell::new(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryDocument;

    #[test]
    fn dom_error_display() {
        let mut doc = MemoryDocument::new();
        let a = doc.create_element("div");
        let b = doc.create_text("x");
        let err = DomError::HierarchyRequest {
            parent: a,
            child: b,
        };
        assert!(err.to_string().contains("cannot append"));
        assert!(DomError::NotAnElement(b).to_string().contains("not an element"));
    }

    #[test]
    fn shared_coerces_to_dyn() {
        let concrete = shared(MemoryDocument::new());
        let dynamic: SharedDocument = concrete.clone();
        let node = dynamic.borrow_mut().create_element("span");
        assert_eq!(concrete.borrow().tag(node), Some("span"));
    }
}
