#![forbid(unsafe_code)]

//! The single-subscriber registry.
//!
//! A binding notifies exactly one render callback. [`SubscriberSlot`] holds it
//! and supports two operations: `replace` and `invoke`. There is no list and
//! no per-field bookkeeping.
//!
//! Finer-grained tracking would replace this slot with a map from field name
//! to a set of subscribers, populated from the read side of
//! [`StateHandle::get`](super::StateHandle::get), which already re-registers
//! the watched callback on every tracked read.

use std::cell::{Cell, RefCell};
use std::error::Error;
use std::rc::Rc;

use rebind_dom::{Element, View};

use super::binding::StateHandle;

/// Outcome of one render callback invocation.
pub type RenderResult = Result<View, Box<dyn Error>>;

/// A type-erased render callback.
pub type RenderFn = Rc<dyn Fn(&StateHandle) -> RenderResult>;

/// Values a render callback may return.
pub trait IntoRender {
    fn into_render(self) -> RenderResult;
}

impl IntoRender for View {
    fn into_render(self) -> RenderResult {
        Ok(self)
    }
}

impl IntoRender for Element {
    fn into_render(self) -> RenderResult {
        Ok(View::Element(self))
    }
}

impl<E: Into<Box<dyn Error>>> IntoRender for Result<View, E> {
    fn into_render(self) -> RenderResult {
        self.map_err(Into::into)
    }
}

/// Erase a render closure into a [`RenderFn`].
pub fn render_fn<F, R>(callback: F) -> RenderFn
where
    F: Fn(&StateHandle) -> R + 'static,
    R: IntoRender,
{
    Rc::new(move |state: &StateHandle| callback(state).into_render())
}

/// One-element registry holding the active render callback.
///
/// # Invariants
///
/// 1. The slot always holds a callback; before the first `replace` it holds a
///    no-op that renders nothing.
/// 2. `replace` discards the previous callback entirely.
/// 3. No borrow of the slot is held while the callback runs.
pub struct SubscriberSlot {
    current: RefCell<RenderFn>,
    replacements: Cell<u64>,
}

impl SubscriberSlot {
    /// Create a slot holding the no-op subscriber.
    #[must_use]
    pub fn new() -> Self {
        let noop: RenderFn = Rc::new(|_: &StateHandle| -> RenderResult { Ok(View::empty()) });
        Self {
            current: RefCell::new(noop),
            replacements: Cell::new(0),
        }
    }

    /// Install `callback` as the active subscriber.
    pub fn replace(&self, callback: RenderFn) {
        *self.current.borrow_mut() = callback;
        self.replacements.set(self.replacements.get() + 1);
    }

    /// A handle to the active subscriber.
    #[must_use]
    pub fn current(&self) -> RenderFn {
        Rc::clone(&*self.current.borrow())
    }

    /// Run the active subscriber.
    pub fn invoke(&self, state: &StateHandle) -> RenderResult {
        let callback = self.current();
        callback(state)
    }

    /// Whether `callback` is the active subscriber.
    #[must_use]
    pub fn is_current(&self, callback: &RenderFn) -> bool {
        Rc::ptr_eq(&*self.current.borrow(), callback)
    }

    /// Whether a subscriber was ever installed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.replacements.get() > 0
    }

    /// Number of `replace` calls so far, including identical re-activations.
    #[must_use]
    pub fn replacements(&self) -> u64 {
        self.replacements.get()
    }
}

impl Default for SubscriberSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubscriberSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSlot")
            .field("active", &self.is_active())
            .field("replacements", &self.replacements.get())
            .finish()
    }
}
