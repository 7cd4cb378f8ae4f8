#![forbid(unsafe_code)]

//! Coupling a state bag to a render callback.
//!
//! A [`ReactiveBinding`] owns a set of fields, a mount node in a shared host
//! document, and a [`SubscriberSlot`]. [`ReactiveBinding::watch`] installs a
//! render callback, paints once, and marks every field present at that moment
//! as tracked. From then on every write to a tracked field through a
//! [`StateHandle`] clears the mount node and rebuilds it from the callback.
//!
//! # Usage
//!
//! ```
//! use rebind_dom::{MemoryDocument, SharedDocument, el, shared};
//! use rebind_runtime::{ReactiveBinding, State};
//!
//! let doc = shared(MemoryDocument::new());
//! let host: SharedDocument = doc.clone();
//! let binding = ReactiveBinding::new(host, State::new().with("price", 1000).with("qty", 10));
//!
//! let mount = binding
//!     .watch(|state| {
//!         let price = state.get("price").and_then(|v| v.as_int()).unwrap_or(0);
//!         let qty = state.get("qty").and_then(|v| v.as_int()).unwrap_or(0);
//!         el("p").child(format!("{price} x {qty} = {}", price * qty))
//!     })
//!     .unwrap();
//!
//! binding.state().set("qty", 11).unwrap();
//! assert_eq!(doc.borrow().text_content(mount).unwrap(), "1000 x 11 = 11000");
//! assert_eq!(binding.render_count(), 2);
//! ```
//!
//! # Invariants
//!
//! 1. `watch` renders exactly once before returning, then tracks the fields
//!    present at that moment, in key order.
//! 2. N tracked writes produce N render cycles. There is no batching and no
//!    equality short-circuit.
//! 3. A tracked read re-activates the watched callback.
//! 4. Writes to fields added after `watch` are stored but never render.
//! 5. No borrow is held across the callback, so callbacks may read and write
//!    any field.
//!
//! # Failure Modes
//!
//! - Callback error or unattachable output: the mount node is left empty and
//!   the error reaches the caller of `render`/`set`.
//! - Re-entrant tracked write from inside the callback: recurses by default
//!   (the outer append then lands after the nested output). See
//!   [`ReentrancyPolicy`].
//! - Reference cycles: a render callback or listener that captures a strong
//!   [`StateHandle`] keeps the binding alive forever. Capture a
//!   [`WeakStateHandle`] instead.
//! - Dropping the last handle releases a mount the binding created itself, so
//!   it is freed once no enclosing view holds it. Drops inside a render
//!   callback take effect when the outermost render on the thread returns.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use rebind_dom::{NodeId, SharedDocument};
use tracing::{debug_span, trace, warn};

use super::config::{BindingConfig, ReentrancyPolicy};
use super::error::{BindingError, RenderCallbackError};
use super::state::State;
use super::subscriber::{IntoRender, RenderFn, SubscriberSlot, render_fn};
use super::value::Value;

// ---------------------------------------------------------------------------
// Shared interior
// ---------------------------------------------------------------------------

struct Field {
    value: Value,
    tracked: bool,
}

struct BindingInner {
    document: SharedDocument,
    mount: NodeId,
    fields: RefCell<IndexMap<String, Field>>,
    slot: SubscriberSlot,
    /// Callback re-activated by tracked reads, installed by `watch`.
    watched: RefCell<Option<RenderFn>>,
    config: BindingConfig,
    depth: Cell<usize>,
    renders: Cell<u64>,
    /// Whether `mount` was created by the builder rather than supplied.
    owns_mount: bool,
}

impl Drop for BindingInner {
    fn drop(&mut self) {
        if self.owns_mount {
            release_mount(Rc::clone(&self.document), self.mount);
        }
    }
}

thread_local! {
    /// Render cycles on the stack, across every binding on this thread.
    static RENDERS_IN_FLIGHT: Cell<usize> = const { Cell::new(0) };
    /// Mount targets of dropped bindings, waiting for the host to release.
    static RELEASED_MOUNTS: RefCell<Vec<(SharedDocument, NodeId)>> =
        const { RefCell::new(Vec::new()) };
}

/// Hand a dropped binding's mount target back to its document.
///
/// A binding dropped inside a render callback usually has its mount embedded
/// in the view being built, so release waits until no render is in flight.
fn release_mount(document: SharedDocument, mount: NodeId) {
    let queued = RELEASED_MOUNTS
        .try_with(|pending| pending.borrow_mut().push((document, mount)))
        .is_ok();
    let idle = RENDERS_IN_FLIGHT.try_with(Cell::get).unwrap_or(0) == 0;
    if queued && idle {
        flush_released_mounts();
    }
}

fn flush_released_mounts() {
    loop {
        let Ok(batch) = RELEASED_MOUNTS.try_with(|pending| pending.take()) else {
            return;
        };
        if batch.is_empty() {
            return;
        }
        let mut busy = Vec::new();
        for (document, mount) in batch {
            // Freeing listeners may drop further bindings, which queue
            // themselves and are picked up by the next pass.
            match document.try_borrow_mut() {
                Ok(mut doc) => {
                    trace!(?mount, "released mount of dropped binding");
                    doc.release_node(mount);
                }
                Err(_) => busy.push((Rc::clone(&document), mount)),
            }
        }
        if !busy.is_empty() {
            let _ = RELEASED_MOUNTS.try_with(|pending| pending.borrow_mut().extend(busy));
            return;
        }
    }
}

/// Tracks one render cycle: decrements the binding's depth when the cycle
/// ends, including on error, and releases queued mounts once the outermost
/// cycle on this thread is done.
struct DepthGuard<'a>(&'a Cell<usize>);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        let _ = RENDERS_IN_FLIGHT.try_with(|n| n.set(n.get() + 1));
        Self(depth)
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
        let idle = RENDERS_IN_FLIGHT
            .try_with(|n| {
                n.set(n.get().saturating_sub(1));
                n.get() == 0
            })
            .unwrap_or(false);
        if idle {
            flush_released_mounts();
        }
    }
}

/// One full render cycle: clear, invoke, append.
fn render_cycle(inner: &Rc<BindingInner>) -> Result<(), BindingError> {
    let depth = inner.depth.get();
    if let Some(limit) = inner.config.depth_limit() {
        if depth >= limit {
            warn!(mount = ?inner.mount, limit, "render depth exceeded");
            return Err(BindingError::RenderDepthExceeded { limit });
        }
    }

    let _span = debug_span!("render_cycle", mount = ?inner.mount, depth).entered();
    let _depth = DepthGuard::enter(&inner.depth);

    inner
        .document
        .borrow_mut()
        .remove_children(inner.mount)
        .map_err(BindingError::Host)?;

    let handle = StateHandle {
        inner: Rc::clone(inner),
    };
    let view = inner.slot.invoke(&handle).map_err(|err| {
        warn!(mount = ?inner.mount, error = %err, "render callback failed");
        RenderCallbackError::Callback(err)
    })?;

    let mounted = view.mount(&mut *inner.document.borrow_mut(), inner.mount);
    if let Err(err) = mounted {
        warn!(mount = ?inner.mount, error = %err, "render output rejected by host");
        // Drop whatever was attached before the failure.
        let _ = inner.document.borrow_mut().remove_children(inner.mount);
        return Err(RenderCallbackError::Attach(err).into());
    }

    inner.renders.set(inner.renders.get() + 1);
    Ok(())
}

// ---------------------------------------------------------------------------
// ReactiveBinding
// ---------------------------------------------------------------------------

/// A state bag bound to a mount node and a single render callback.
///
/// Cloning shares the same binding.
#[derive(Clone)]
pub struct ReactiveBinding {
    inner: Rc<BindingInner>,
}

impl ReactiveBinding {
    /// Bind `state` to a fresh, detached `div` in `document`.
    #[must_use]
    pub fn new(document: SharedDocument, state: State) -> Self {
        Self::builder(document, state).build()
    }

    /// Bind `state` to an existing mount node.
    #[must_use]
    pub fn with_mount(document: SharedDocument, state: State, mount: NodeId) -> Self {
        Self::builder(document, state).mount(mount).build()
    }

    /// Start configuring a binding.
    #[must_use]
    pub fn builder(document: SharedDocument, state: State) -> BindingBuilder {
        BindingBuilder {
            document,
            state,
            mount: None,
            config: BindingConfig::default(),
        }
    }

    /// Install `callback` as the active subscriber, replacing any previous
    /// one. Does not render.
    pub fn activate<F, R>(&self, callback: F)
    where
        F: Fn(&StateHandle) -> R + 'static,
        R: IntoRender,
    {
        self.activate_fn(render_fn(callback));
    }

    /// Install an already erased render callback.
    pub fn activate_fn(&self, callback: RenderFn) {
        trace!(mount = ?self.inner.mount, "subscriber activated");
        self.inner.slot.replace(callback);
    }

    /// Install a dynamically typed subscriber.
    ///
    /// `candidate` must be a boxed [`RenderFn`]. Anything else fails with
    /// [`BindingError::InvalidCallback`] and leaves the binding untouched.
    pub fn activate_any(&self, candidate: Box<dyn Any>) -> Result<(), BindingError> {
        match candidate.downcast::<RenderFn>() {
            Ok(callback) => {
                self.activate_fn(*callback);
                Ok(())
            }
            Err(_) => Err(BindingError::InvalidCallback),
        }
    }

    /// Clear the mount node, run the active subscriber, and append its output.
    pub fn render(&self) -> Result<(), BindingError> {
        render_cycle(&self.inner)
    }

    /// Activate `callback`, render once, and start tracking every field
    /// currently present. Returns the mount node.
    pub fn watch<F, R>(&self, callback: F) -> Result<NodeId, BindingError>
    where
        F: Fn(&StateHandle) -> R + 'static,
        R: IntoRender,
    {
        let callback = render_fn(callback);
        self.activate_fn(Rc::clone(&callback));
        // Fields tracked by an earlier watch re-activate the new callback from
        // the first paint onward.
        *self.inner.watched.borrow_mut() = Some(callback);
        self.render()?;

        let mut fields = self.inner.fields.borrow_mut();
        for (name, field) in fields.iter_mut() {
            if !field.tracked {
                trace!(mount = ?self.inner.mount, field = %name, "field tracked");
                field.tracked = true;
            }
        }
        Ok(self.inner.mount)
    }

    /// Accessor for the bound fields.
    #[must_use]
    pub fn state(&self) -> StateHandle {
        StateHandle {
            inner: Rc::clone(&self.inner),
        }
    }

    /// The mount node this binding renders into.
    #[must_use]
    pub fn mount(&self) -> NodeId {
        self.inner.mount
    }

    /// The host document.
    #[must_use]
    pub fn document(&self) -> SharedDocument {
        Rc::clone(&self.inner.document)
    }

    #[must_use]
    pub fn config(&self) -> &BindingConfig {
        &self.inner.config
    }

    /// Number of completed render cycles.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.inner.renders.get()
    }

    /// Whether a render cycle is on the stack right now.
    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.inner.depth.get() > 0
    }

    /// Whether a subscriber was ever activated.
    #[must_use]
    pub fn has_subscriber(&self) -> bool {
        self.inner.slot.is_active()
    }

    /// The subscriber slot, for inspection.
    #[must_use]
    pub fn subscriber(&self) -> &SubscriberSlot {
        &self.inner.slot
    }
}

impl std::fmt::Debug for ReactiveBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveBinding")
            .field("mount", &self.inner.mount)
            .field("fields", &self.inner.fields.borrow().len())
            .field("renders", &self.inner.renders.get())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Configures a [`ReactiveBinding`] before construction.
pub struct BindingBuilder {
    document: SharedDocument,
    state: State,
    mount: Option<NodeId>,
    config: BindingConfig,
}

impl BindingBuilder {
    /// Render into `mount` instead of a fresh `div`.
    #[must_use]
    pub fn mount(mut self, mount: NodeId) -> Self {
        self.mount = Some(mount);
        self
    }

    #[must_use]
    pub fn config(mut self, config: BindingConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn build(self) -> ReactiveBinding {
        let owns_mount = self.mount.is_none();
        let mount = {
            let mut doc = self.document.borrow_mut();
            let mount = self.mount.unwrap_or_else(|| doc.create_element("div"));
            doc.retain_node(mount);
            mount
        };
        let fields: IndexMap<String, Field> = self
            .state
            .into_iter()
            .map(|(name, value)| {
                (
                    name,
                    Field {
                        value,
                        tracked: false,
                    },
                )
            })
            .collect();
        ReactiveBinding {
            inner: Rc::new(BindingInner {
                document: self.document,
                mount,
                fields: RefCell::new(fields),
                slot: SubscriberSlot::new(),
                watched: RefCell::new(None),
                config: self.config,
                depth: Cell::new(0),
                renders: Cell::new(0),
                owns_mount,
            }),
        }
    }
}

impl std::fmt::Debug for BindingBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingBuilder")
            .field("state", &self.state)
            .field("mount", &self.mount)
            .field("config", &self.config)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// StateHandle
// ---------------------------------------------------------------------------

/// Intercepting accessor for a binding's fields.
///
/// Render callbacks receive one; [`ReactiveBinding::state`] hands out more.
#[derive(Clone)]
pub struct StateHandle {
    inner: Rc<BindingInner>,
}

impl StateHandle {
    /// Read a field. A tracked read re-activates the watched callback.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        let (value, tracked) = {
            let fields = self.inner.fields.borrow();
            let field = fields.get(name)?;
            (field.value.clone(), field.tracked)
        };
        if tracked {
            let watched = self.inner.watched.borrow().clone();
            if let Some(callback) = watched {
                self.inner.slot.replace(callback);
            }
        }
        Some(value)
    }

    /// Write a field.
    ///
    /// A tracked field stores the value and renders. Any other name is stored
    /// as a plain, untracked entry.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), BindingError> {
        let value = value.into();
        let tracked = self.inner.fields.borrow().get(name).map(|f| f.tracked);
        match tracked {
            Some(true) => {
                if self.inner.config.reentrancy == ReentrancyPolicy::Reject
                    && self.inner.depth.get() > 0
                {
                    warn!(mount = ?self.inner.mount, field = name, "re-entrant write rejected");
                    return Err(BindingError::ReentrantRender {
                        field: name.to_owned(),
                    });
                }
                trace!(mount = ?self.inner.mount, field = name, %value, "tracked field written");
                if let Some(field) = self.inner.fields.borrow_mut().get_mut(name) {
                    field.value = value;
                }
                render_cycle(&self.inner)
            }
            Some(false) => {
                trace!(mount = ?self.inner.mount, field = name, "untracked field written");
                if let Some(field) = self.inner.fields.borrow_mut().get_mut(name) {
                    field.value = value;
                }
                Ok(())
            }
            None => {
                trace!(mount = ?self.inner.mount, field = name, "untracked field added");
                self.inner.fields.borrow_mut().insert(
                    name.to_owned(),
                    Field {
                        value,
                        tracked: false,
                    },
                );
                Ok(())
            }
        }
    }

    /// Read-modify-write. A missing field reads as [`Value::Null`].
    pub fn update<R: Into<Value>>(
        &self,
        name: &str,
        f: impl FnOnce(Value) -> R,
    ) -> Result<(), BindingError> {
        let current = self.get(name).unwrap_or_default();
        self.set(name, f(current))
    }

    /// Read every field, in order, through [`get`](Self::get).
    #[must_use]
    pub fn snapshot(&self) -> State {
        let names: Vec<String> = self.inner.fields.borrow().keys().cloned().collect();
        names
            .into_iter()
            .filter_map(|name| self.get(&name).map(|value| (name, value)))
            .collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.fields.borrow().contains_key(name)
    }

    #[must_use]
    pub fn is_tracked(&self, name: &str) -> bool {
        self.inner
            .fields
            .borrow()
            .get(name)
            .is_some_and(|field| field.tracked)
    }

    /// Tracked field names in key order.
    #[must_use]
    pub fn tracked_fields(&self) -> Vec<String> {
        self.inner
            .fields
            .borrow()
            .iter()
            .filter(|(_, field)| field.tracked)
            .map(|(name, _)| name.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.fields.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.fields.borrow().is_empty()
    }

    /// A handle that does not keep the binding alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakStateHandle {
        WeakStateHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = self.inner.fields.borrow();
        let mut map = f.debug_map();
        for (name, field) in fields.iter() {
            map.entry(name, &field.value);
        }
        map.finish()
    }
}

/// Non-owning [`StateHandle`], for listeners stored in the document.
#[derive(Clone)]
pub struct WeakStateHandle {
    inner: Weak<BindingInner>,
}

impl WeakStateHandle {
    /// The live handle, if the binding still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<StateHandle> {
        self.inner.upgrade().map(|inner| StateHandle { inner })
    }
}

impl std::fmt::Debug for WeakStateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakStateHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
