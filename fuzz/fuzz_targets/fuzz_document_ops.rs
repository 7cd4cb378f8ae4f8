#![no_main]

//! Random tree surgery on `MemoryDocument`.
//!
//! Every operation may fail, none may panic, and the tree must stay
//! acyclic with consistent parent links.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rebind_dom::{Document, MemoryDocument, NodeId};

#[derive(Arbitrary, Debug)]
enum Op {
    Element(u8),
    Text(String),
    Append { parent: u8, child: u8 },
    Clear(u8),
    Retain(u8),
    Attribute { node: u8, value: String },
}

const TAGS: [&str; 4] = ["div", "p", "span", "button"];

fuzz_target!(|ops: Vec<Op>| {
    let mut doc = MemoryDocument::new();
    let mut nodes: Vec<NodeId> = vec![doc.create_element("div")];
    let pick = |nodes: &[NodeId], i: u8| nodes[usize::from(i) % nodes.len()];

    for op in ops.into_iter().take(256) {
        match op {
            Op::Element(tag) => {
                nodes.push(doc.create_element(TAGS[usize::from(tag) % TAGS.len()]));
            }
            Op::Text(content) => nodes.push(doc.create_text(&content)),
            Op::Append { parent, child } => {
                let _ = doc.append_child(pick(&nodes, parent), pick(&nodes, child));
            }
            Op::Clear(node) => {
                let _ = doc.remove_children(pick(&nodes, node));
            }
            Op::Retain(node) => doc.retain_node(pick(&nodes, node)),
            Op::Attribute { node, value } => {
                let _ = doc.set_attribute(pick(&nodes, node), "data-x", &value);
            }
        }
    }

    for &node in &nodes {
        if !doc.contains(node) {
            continue;
        }
        for child in doc.children(node).unwrap_or_default() {
            assert_eq!(doc.parent(child).ok().flatten(), Some(node));
        }
        let _ = doc.outer_html(node);
    }
});
