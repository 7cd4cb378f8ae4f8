#![forbid(unsafe_code)]

//! Event listeners and dispatch.
//!
//! Listeners frequently write reactive state, which re-renders into the same
//! document. [`dispatch`] therefore copies the listener list out under a short
//! borrow and runs every listener with the document unborrowed.

use std::rc::Rc;

use crate::document::{DomError, NodeId, SharedDocument};

/// An event delivered to a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event name, e.g. `"click"`.
    pub name: String,
    /// Node the event was dispatched on.
    pub target: NodeId,
}

/// A shared event listener.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Dispatch `name` on `target`, returning how many listeners ran.
///
/// There is no bubbling; only listeners registered directly on `target` are
/// invoked, in registration order.
pub fn dispatch(document: &SharedDocument, target: NodeId, name: &str) -> Result<usize, DomError> {
    let listeners = document.borrow().listeners(target, name)?;
    let event = Event {
        name: name.to_owned(),
        target,
    };
    for listener in &listeners {
        listener(&event);
    }
    Ok(listeners.len())
}
