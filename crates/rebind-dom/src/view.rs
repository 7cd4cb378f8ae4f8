#![forbid(unsafe_code)]

//! Document-independent view trees.
//!
//! A [`View`] describes nodes to create; nothing touches a [`Document`] until
//! [`View::mount`] is called with one. Render callbacks build views with
//! [`el`] and [`text`] and hand them back to the binding, which owns the
//! document for the duration of the append.
//!
//! # Usage
//!
//! ```
//! use rebind_dom::{Document, MemoryDocument, el, text};
//!
//! let mut doc = MemoryDocument::new();
//! let root = doc.create_element("div");
//!
//! el("p").class("total").child(text("1000 x 10 = 10000")).mount(&mut doc, root).unwrap();
//! assert_eq!(
//!     doc.inner_html(root).unwrap(),
//!     "<p class=\"total\">1000 x 10 = 10000</p>"
//! );
//! ```
//!
//! Existing nodes (for example another binding's mount target) are embedded
//! with [`View::node`]; mounting moves them under the new parent.

use std::rc::Rc;

use crate::document::{Document, DomError, NodeId};
use crate::event::{Event, Listener};

/// A renderable value.
#[derive(Clone)]
pub enum View {
    /// An element to create.
    Element(Element),
    /// A text node to create.
    Text(String),
    /// An existing node to move into place.
    Node(NodeId),
    /// Several siblings, mounted in order. An empty fragment mounts nothing.
    Fragment(Vec<View>),
}

impl View {
    /// A view that mounts nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::Fragment(Vec::new())
    }

    /// Embed an existing node.
    #[must_use]
    pub fn node(id: NodeId) -> Self {
        Self::Node(id)
    }

    /// Materialize this view as the last children of `parent`.
    ///
    /// Every created node is attached to `parent` before anything is mounted
    /// under it. On error, nodes mounted before the failure stay in place and
    /// go away with the next clear of `parent`.
    pub fn mount(self, doc: &mut dyn Document, parent: NodeId) -> Result<(), DomError> {
        match self {
            Self::Element(element) => element.mount(doc, parent),
            Self::Text(content) => {
                let node = doc.create_text(&content);
                attach_or_release(doc, parent, node)
            }
            Self::Node(node) => doc.append_child(parent, node),
            Self::Fragment(views) => {
                for view in views {
                    view.mount(doc, parent)?;
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Element(element) => std::fmt::Debug::fmt(element, f),
            Self::Text(content) => f.debug_tuple("Text").field(content).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Self::Fragment(views) => f.debug_list().entries(views).finish(),
        }
    }
}

impl From<Element> for View {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<String> for View {
    fn from(content: String) -> Self {
        Self::Text(content)
    }
}

impl From<&str> for View {
    fn from(content: &str) -> Self {
        Self::Text(content.to_owned())
    }
}

impl From<NodeId> for View {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<Vec<View>> for View {
    fn from(views: Vec<View>) -> Self {
        Self::Fragment(views)
    }
}

/// An element under construction.
#[derive(Clone)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    listeners: Vec<(String, Listener)>,
    children: Vec<View>,
}

impl Element {
    /// Start an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            listeners: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute. Later values for the same name win.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Shorthand for `attr("class", ..)`.
    #[must_use]
    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    /// Register a listener for `event`.
    #[must_use]
    pub fn on(mut self, event: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Self {
        self.listeners.push((event.into(), Rc::new(handler)));
        self
    }

    /// Append one child.
    #[must_use]
    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    #[must_use]
    pub fn children<I, V>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Materialize this element as the last child of `parent`.
    pub fn mount(self, doc: &mut dyn Document, parent: NodeId) -> Result<(), DomError> {
        let node = doc.create_element(&self.tag);
        attach_or_release(doc, parent, node)?;
        for (name, value) in &self.attributes {
            doc.set_attribute(node, name, value)?;
        }
        for (event, listener) in self.listeners {
            doc.add_listener(node, &event, listener)?;
        }
        for child in self.children {
            child.mount(doc, node)?;
        }
        Ok(())
    }
}

/// Append a freshly created `node`, freeing it if `parent` rejects it.
fn attach_or_release(
    doc: &mut dyn Document,
    parent: NodeId,
    node: NodeId,
) -> Result<(), DomError> {
    if let Err(err) = doc.append_child(parent, node) {
        doc.release_node(node);
        return Err(err);
    }
    Ok(())
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("listener_count", &self.listeners.len())
            .field("children", &self.children)
            .finish()
    }
}

/// Start an element.
#[must_use]
pub fn el(tag: impl Into<String>) -> Element {
    Element::new(tag)
}

/// A text view.
#[must_use]
pub fn text(content: impl Into<String>) -> View {
    View::Text(content.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryDocument, SharedDocument, dispatch, shared};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    #[test]
    fn nested_elements_mount_in_order() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("div");
        el("div")
            .child(el("p").child("1000 x 10 = 10000"))
            .child(el("button").class("my-btn").child("Add"))
            .mount(&mut doc, root)
            .unwrap();

        assert_eq!(
            doc.inner_html(root).unwrap(),
            "<div><p>1000 x 10 = 10000</p><button class=\"my-btn\">Add</button></div>"
        );
    }

    #[test]
    fn fragment_mounts_siblings() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("ul");
        View::from(vec![
            View::from(el("li").child("a")),
            View::from(el("li").child("b")),
        ])
        .mount(&mut doc, root)
        .unwrap();
        assert_eq!(doc.children(root).unwrap().len(), 2);
    }

    #[test]
    fn empty_view_mounts_nothing() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("div");
        View::empty().mount(&mut doc, root).unwrap();
        assert!(doc.children(root).unwrap().is_empty());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn existing_node_is_moved() {
        let mut doc = MemoryDocument::new();
        let first = doc.create_element("div");
        let second = doc.create_element("div");
        let leaf = doc.create_element("span");
        doc.append_child(first, leaf).unwrap();

        el("section")
            .child(View::node(leaf))
            .mount(&mut doc, second)
            .unwrap();
        assert!(doc.children(first).unwrap().is_empty());
        assert_eq!(
            doc.inner_html(second).unwrap(),
            "<section><span></span></section>"
        );
    }

    #[test]
    fn mounting_parent_into_itself_fails() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("div");
        let err = View::node(root).mount(&mut doc, root).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest { .. }));
    }

    #[test]
    fn failed_mount_leaves_no_detached_nodes() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("div");
        let before = doc.len();

        for _ in 0..10 {
            let err = el("div")
                .child(el("p").child(text("x")))
                .child(View::node(root))
                .mount(&mut doc, root)
                .unwrap_err();
            assert!(matches!(err, DomError::HierarchyRequest { .. }));
            doc.remove_children(root).unwrap();
            assert_eq!(doc.len(), before);
        }
    }

    #[test]
    fn rejected_text_is_freed() {
        let mut doc = MemoryDocument::new();
        let leaf = doc.create_text("leaf");
        let before = doc.len();
        let err = text("orphan").mount(&mut doc, leaf).unwrap_err();
        assert!(matches!(err, DomError::NotAnElement(_)));
        assert_eq!(doc.len(), before);
        let err = el("p").child("orphan").mount(&mut doc, leaf).unwrap_err();
        assert!(matches!(err, DomError::NotAnElement(_)));
        assert_eq!(doc.len(), before);
    }

    #[test]
    fn listeners_are_registered() {
        let doc = shared(MemoryDocument::new());
        let root = doc.borrow_mut().create_element("div");
        let clicks = Rc::new(Cell::new(0));
        let c = Rc::clone(&clicks);
        el("button")
            .on("click", move |_| c.set(c.get() + 1))
            .mount(&mut *doc.borrow_mut(), root)
            .unwrap();

        let button = doc.borrow().find_by_tag(root, "button").unwrap()[0];
        let shared_doc: SharedDocument = doc.clone();
        dispatch(&shared_doc, button, "click").unwrap();
        dispatch(&shared_doc, button, "click").unwrap();
        assert_eq!(clicks.get(), 2);
    }

    #[test]
    fn children_accepts_iterators() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("div");
        el("p")
            .children(["a", "b", "c"])
            .mount(&mut doc, root)
            .unwrap();
        assert_eq!(doc.text_content(root).unwrap(), "abc");
    }
}
