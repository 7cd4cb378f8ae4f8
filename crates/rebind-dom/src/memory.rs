#![forbid(unsafe_code)]

//! Headless, arena-backed [`Document`] implementation.
//!
//! # Design
//!
//! Nodes live in a [`SlotMap`] keyed by [`NodeId`]. Generational keys make a
//! stale handle (one whose node has been freed) fail with
//! [`DomError::NodeNotFound`] instead of aliasing a newer node.
//!
//! # Memory
//!
//! `remove_children` frees the removed subtrees, except nodes registered with
//! [`Document::retain_node`]. A retained node is only detached, together with
//! its own children, so a binding's mount target can be re-appended by the
//! next render of an enclosing binding. [`Document::release_node`] hands such
//! a node back to the tree: it is freed at once when detached, otherwise
//! together with its parent.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Stale handle | Node freed by an ancestor clear | `NodeNotFound` |
//! | Cycle | Appending an ancestor into a descendant | `HierarchyRequest` |
//! | Text parent | Appending into a text node | `NotAnElement` |

use std::fmt::Write as _;

use slotmap::SlotMap;

use crate::document::{Document, DomError, NodeId};
use crate::event::Listener;

enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        listeners: Vec<(String, Listener)>,
        children: Vec<NodeId>,
    },
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    retained: bool,
}

/// An in-memory document tree.
#[derive(Default)]
pub struct MemoryDocument {
    nodes: SlotMap<NodeId, NodeData>,
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("node_count", &self.nodes.len())
            .finish()
    }
}

impl MemoryDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `node` refers to a live node.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Tag name of an element, `None` for text nodes and stale handles.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Value of an attribute on an element.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    /// Concatenated text of `node` and all its descendants.
    pub fn text_content(&self, node: NodeId) -> Result<String, DomError> {
        let mut out = String::new();
        self.collect_text(node, &mut out)?;
        Ok(out)
    }

    /// Serialize `node` and its subtree as HTML.
    pub fn outer_html(&self, node: NodeId) -> Result<String, DomError> {
        let mut out = String::new();
        self.write_html(node, &mut out)?;
        Ok(out)
    }

    /// Serialize the children of `node` as HTML.
    pub fn inner_html(&self, node: NodeId) -> Result<String, DomError> {
        let mut out = String::new();
        for child in self.children(node)? {
            self.write_html(child, &mut out)?;
        }
        Ok(out)
    }

    /// All elements with tag `tag` in the subtree rooted at `root`, in
    /// document order (the root included).
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Result<Vec<NodeId>, DomError> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let data = self.node(id)?;
            if let NodeKind::Element {
                tag: own, children, ..
            } = &data.kind
            {
                if own == tag {
                    found.push(id);
                }
                stack.extend(children.iter().rev().copied());
            }
        }
        Ok(found)
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(id).ok_or(DomError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(id).ok_or(DomError::NodeNotFound(id))
    }

    fn children_mut(&mut self, id: NodeId) -> Result<&mut Vec<NodeId>, DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { children, .. } => Ok(children),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) -> Result<(), DomError> {
        match &self.node(id)?.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { children, .. } => {
                for child in children {
                    self.collect_text(*child, out)?;
                }
            }
        }
        Ok(())
    }

    fn write_html(&self, id: NodeId, out: &mut String) -> Result<(), DomError> {
        match &self.node(id)?.kind {
            NodeKind::Text(text) => {
                let _ = write!(out, "{}", v_htmlescape::escape(text));
            }
            NodeKind::Element {
                tag,
                attributes,
                children,
                ..
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{}\"", v_htmlescape::escape(value));
                }
                out.push('>');
                for child in children {
                    self.write_html(*child, out)?;
                }
                let _ = write!(out, "</{tag}>");
            }
        }
        Ok(())
    }

    /// Whether `candidate` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == candidate {
                return true;
            }
            cursor = self.nodes.get(id).and_then(|data| data.parent);
        }
        false
    }

    fn detach(&mut self, child: NodeId) -> Result<(), DomError> {
        let Some(old_parent) = self.node(child)?.parent else {
            return Ok(());
        };
        self.children_mut(old_parent)?.retain(|id| *id != child);
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    /// Free `id` and its subtree, sparing retained descendants (which are
    /// detached instead).
    fn free_subtree(&mut self, id: NodeId) {
        let Some(data) = self.nodes.remove(id) else {
            return;
        };
        if let NodeKind::Element { children, .. } = data.kind {
            for child in children {
                self.release(child);
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        let Some(data) = self.nodes.get_mut(id) else {
            return;
        };
        if data.retained {
            data.parent = None;
        } else {
            self.free_subtree(id);
        }
    }
}

impl Document for MemoryDocument {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.insert(NodeData {
            kind: NodeKind::Element {
                tag: tag.to_owned(),
                attributes: Vec::new(),
                listeners: Vec::new(),
                children: Vec::new(),
            },
            parent: None,
            retained: false,
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.nodes.insert(NodeData {
            kind: NodeKind::Text(text.to_owned()),
            parent: None,
            retained: false,
        })
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(key, _)| key == name) {
                    Some((_, existing)) => value.clone_into(existing),
                    None => attributes.push((name.to_owned(), value.to_owned())),
                }
                Ok(())
            }
            NodeKind::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    fn add_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: Listener,
    ) -> Result<(), DomError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Element { listeners, .. } => {
                listeners.push((event.to_owned(), listener));
                Ok(())
            }
            NodeKind::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(child)?;
        if !matches!(self.node(parent)?.kind, NodeKind::Element { .. }) {
            return Err(DomError::NotAnElement(parent));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.detach(child)?;
        self.children_mut(parent)?.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn remove_children(&mut self, node: NodeId) -> Result<(), DomError> {
        let removed = std::mem::take(self.children_mut(node)?);
        #[cfg(feature = "tracing")]
        tracing::trace!(?node, removed = removed.len(), "remove_children");
        for child in removed {
            self.release(child);
        }
        Ok(())
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DomError> {
        match &self.node(node)?.kind {
            NodeKind::Element { children, .. } => Ok(children.clone()),
            NodeKind::Text(_) => Ok(Vec::new()),
        }
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        Ok(self.node(node)?.parent)
    }

    fn listeners(&self, node: NodeId, event: &str) -> Result<Vec<Listener>, DomError> {
        match &self.node(node)?.kind {
            NodeKind::Element { listeners, .. } => Ok(listeners
                .iter()
                .filter(|(name, _)| name == event)
                .map(|(_, listener)| listener.clone())
                .collect()),
            NodeKind::Text(_) => Ok(Vec::new()),
        }
    }

    fn retain_node(&mut self, node: NodeId) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.retained = true;
        }
    }

    fn release_node(&mut self, node: NodeId) {
        let Some(data) = self.nodes.get_mut(node) else {
            return;
        };
        data.retained = false;
        if data.parent.is_none() {
            self.free_subtree(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn append_and_serialize() {
        let mut doc = MemoryDocument::new();
        let div = doc.create_element("div");
        let p = doc.create_element("p");
        doc.set_attribute(p, "class", "note").unwrap();
        let t = doc.create_text("a < b");
        doc.append_child(p, t).unwrap();
        doc.append_child(div, p).unwrap();

        assert_eq!(
            doc.outer_html(div).unwrap(),
            "<div><p class=\"note\">a &lt; b</p></div>"
        );
        assert_eq!(doc.text_content(div).unwrap(), "a < b");
        assert_eq!(doc.parent(p).unwrap(), Some(div));
    }

    #[test]
    fn set_attribute_overwrites() {
        let mut doc = MemoryDocument::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "id", "a").unwrap();
        doc.set_attribute(div, "id", "b").unwrap();
        assert_eq!(doc.attribute(div, "id"), Some("b"));
        assert_eq!(doc.outer_html(div).unwrap(), "<div id=\"b\"></div>");
    }

    #[test]
    fn append_moves_existing_child() {
        let mut doc = MemoryDocument::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_text("c");
        doc.append_child(a, c).unwrap();
        doc.append_child(b, c).unwrap();

        assert!(doc.children(a).unwrap().is_empty());
        assert_eq!(doc.children(b).unwrap(), vec![c]);
        assert_eq!(doc.parent(c).unwrap(), Some(b));
    }

    #[test]
    fn append_into_self_or_descendant_rejected() {
        let mut doc = MemoryDocument::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();

        assert_eq!(
            doc.append_child(outer, outer),
            Err(DomError::HierarchyRequest {
                parent: outer,
                child: outer
            })
        );
        assert!(matches!(
            doc.append_child(inner, outer),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn append_into_text_rejected() {
        let mut doc = MemoryDocument::new();
        let t = doc.create_text("t");
        let div = doc.create_element("div");
        assert_eq!(doc.append_child(t, div), Err(DomError::NotAnElement(t)));
    }

    #[test]
    fn remove_children_frees_subtree() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("div");
        let p = doc.create_element("p");
        let t = doc.create_text("gone");
        doc.append_child(p, t).unwrap();
        doc.append_child(root, p).unwrap();
        assert_eq!(doc.len(), 3);

        doc.remove_children(root).unwrap();
        assert!(doc.children(root).unwrap().is_empty());
        assert_eq!(doc.len(), 1);
        assert!(!doc.contains(p));
        assert_eq!(doc.text_content(t), Err(DomError::NodeNotFound(t)));
    }

    #[test]
    fn retained_node_survives_clear() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("div");
        let wrapper = doc.create_element("section");
        let mount = doc.create_element("div");
        doc.retain_node(mount);
        let t = doc.create_text("kept");
        doc.append_child(mount, t).unwrap();
        doc.append_child(wrapper, mount).unwrap();
        doc.append_child(root, wrapper).unwrap();

        doc.remove_children(root).unwrap();
        assert!(!doc.contains(wrapper));
        assert!(doc.contains(mount));
        assert_eq!(doc.parent(mount).unwrap(), None);
        assert_eq!(doc.text_content(mount).unwrap(), "kept");

        doc.append_child(root, mount).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "<div>kept</div>");
    }

    #[test]
    fn released_detached_node_is_freed() {
        let mut doc = MemoryDocument::new();
        let mount = doc.create_element("div");
        doc.retain_node(mount);
        let t = doc.create_text("gone");
        doc.append_child(mount, t).unwrap();

        doc.release_node(mount);
        assert!(!doc.contains(mount));
        assert!(!doc.contains(t));
        assert!(doc.is_empty());

        // Releasing a freed handle is a no-op.
        doc.release_node(mount);
    }

    #[test]
    fn released_attached_node_goes_with_parent() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("div");
        let mount = doc.create_element("div");
        doc.retain_node(mount);
        doc.append_child(root, mount).unwrap();

        doc.release_node(mount);
        assert!(doc.contains(mount));
        assert_eq!(doc.parent(mount).unwrap(), Some(root));

        doc.remove_children(root).unwrap();
        assert!(!doc.contains(mount));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn find_by_tag_document_order() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("div");
        let b1 = doc.create_element("button");
        let p = doc.create_element("p");
        let b2 = doc.create_element("button");
        doc.append_child(root, b1).unwrap();
        doc.append_child(root, p).unwrap();
        doc.append_child(p, b2).unwrap();

        assert_eq!(doc.find_by_tag(root, "button").unwrap(), vec![b1, b2]);
        assert_eq!(doc.find_by_tag(root, "div").unwrap(), vec![root]);
    }

    #[test]
    fn debug_reports_node_count() {
        let mut doc = MemoryDocument::new();
        doc.create_element("div");
        assert!(format!("{doc:?}").contains("node_count: 1"));
    }
}
