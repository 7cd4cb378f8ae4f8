#![forbid(unsafe_code)]

//! Host document primitives for rebind.
//!
//! This crate is the leaf of the workspace. It provides:
//!
//! - [`Document`]: the capability set a reactive binding needs from its host
//!   (create nodes, append a child, remove all children).
//! - [`MemoryDocument`]: an arena-backed, headless implementation used by
//!   tests and the demo.
//! - [`View`]: a small tree-building facility for render callbacks. Views are
//!   plain values; they touch a document only when mounted.
//! - [`dispatch`]: event delivery that never holds a document borrow while a
//!   listener runs.

pub mod document;
pub mod event;
pub mod memory;
pub mod view;

pub use document::{Document, DomError, NodeId, SharedDocument, shared};
pub use event::{Event, Listener, dispatch};
pub use memory::MemoryDocument;
pub use view::{Element, View, el, text};
