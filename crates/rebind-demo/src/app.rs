#![forbid(unsafe_code)]

//! Price x quantity calculator.
//!
//! ```text
//! <div>
//!   <div><p>Date now: ...</p></div>       clock, its own binding
//!   <p>{price} x {qty} = {total}</p>
//!   <button class="my-btn">Add Qty by 1</button>
//!   <button class="my-btn">Add Price by 1000</button>
//! </div>
//! ```
//!
//! Both buttons write tracked fields, so every click repaints the whole app.
//! Each app repaint also re-watches the clock, which repaints it in turn.

use std::cell::RefCell;
use std::rc::Rc;

use rebind_dom::{
    Document, Event, MemoryDocument, NodeId, SharedDocument, View, dispatch, el, shared,
};
use rebind_runtime::{
    BindingConfig, BindingError, ReactiveBinding, State, StateHandle, WeakStateHandle,
};
use rebind_widgets::{Clock, TimeSource, button};
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::error::DemoError;

pub const QTY_STEP: i64 = 1;
pub const PRICE_STEP: i64 = 1000;
pub const QTY_LABEL: &str = "Add Qty by 1";
pub const PRICE_LABEL: &str = "Add Price by 1000";

/// `{ price: 1000, qty: 10 }`
#[must_use]
pub fn initial_state() -> State {
    State::new().with("price", 1000).with("qty", 10)
}

/// The demo application over its own in-memory document.
pub struct App {
    document: Rc<RefCell<MemoryDocument>>,
    root: NodeId,
    binding: ReactiveBinding,
    clock: Rc<Clock>,
}

impl App {
    /// An app whose clock reads the system local time.
    #[must_use]
    pub fn new(config: BindingConfig, started: Instant) -> Self {
        Self::build(config, |host| Clock::new(host, started))
    }

    /// An app whose clock reads dates from `source`.
    #[must_use]
    pub fn with_time_source(config: BindingConfig, started: Instant, source: TimeSource) -> Self {
        Self::build(config, |host| Clock::with_time_source(host, started, source))
    }

    fn build(config: BindingConfig, clock: impl FnOnce(SharedDocument) -> Clock) -> Self {
        let document = shared(MemoryDocument::new());
        let root = document.borrow_mut().create_element("div");
        let host: SharedDocument = document.clone();
        let clock = Rc::new(clock(Rc::clone(&host)));
        let binding = ReactiveBinding::builder(host, initial_state())
            .mount(root)
            .config(config)
            .build();
        Self {
            document,
            root,
            binding,
            clock,
        }
    }

    /// Watch the app state and paint the first frame.
    pub fn mount(&self) -> Result<NodeId, DemoError> {
        let clock = Rc::clone(&self.clock);
        let handle = self.binding.state().downgrade();
        let root = self
            .binding
            .watch(move |state: &StateHandle| render_app(state, &clock, &handle))?;
        info!(config = ?self.binding.config(), "app mounted");
        Ok(root)
    }

    /// Advance the clock to `now`. Returns the number of clock writes.
    pub fn tick(&self, now: Instant) -> Result<u32, DemoError> {
        Ok(self.clock.tick(now)?)
    }

    /// Dispatch a click on the button labelled `label`. Returns the number of
    /// listeners that ran.
    pub fn click(&self, label: &str) -> Result<usize, DemoError> {
        if !self.binding.has_subscriber() {
            return Err(DemoError::NotMounted);
        }
        let target = {
            let doc = self.document.borrow();
            doc.find_by_tag(self.root, "button")?
                .into_iter()
                .find(|&node| doc.text_content(node).is_ok_and(|text| text == label))
        };
        let target = target.ok_or_else(|| DemoError::MissingButton(label.to_owned()))?;

        debug!(label, "click");
        let host: SharedDocument = self.document.clone();
        Ok(dispatch(&host, target, "click")?)
    }

    /// Serialized markup of the whole app.
    pub fn html(&self) -> Result<String, DemoError> {
        Ok(self.document.borrow().outer_html(self.root)?)
    }

    #[must_use]
    pub fn price(&self) -> i64 {
        read_int(&self.binding.state(), "price")
    }

    #[must_use]
    pub fn qty(&self) -> i64 {
        read_int(&self.binding.state(), "qty")
    }

    #[must_use]
    pub fn total(&self) -> i64 {
        self.price().saturating_mul(self.qty())
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn binding(&self) -> &ReactiveBinding {
        &self.binding
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[must_use]
    pub fn document(&self) -> Rc<RefCell<MemoryDocument>> {
        Rc::clone(&self.document)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("root", &self.root)
            .field("binding", &self.binding)
            .field("clock", &self.clock)
            .finish()
    }
}

fn read_int(state: &StateHandle, name: &str) -> i64 {
    state.get(name).and_then(|value| value.as_int()).unwrap_or(0)
}

fn render_app(
    state: &StateHandle,
    clock: &Clock,
    handle: &WeakStateHandle,
) -> Result<View, BindingError> {
    let price = read_int(state, "price");
    let qty = read_int(state, "qty");
    let total = price.saturating_mul(qty);

    Ok(el("div")
        .child(clock.view()?)
        .child(el("p").child(format!("{price} x {qty} = {total}")))
        .child(button(QTY_LABEL, increment(handle.clone(), "qty", QTY_STEP)))
        .child(button(PRICE_LABEL, increment(handle.clone(), "price", PRICE_STEP)))
        .into())
}

fn increment(
    handle: WeakStateHandle,
    field: &'static str,
    step: i64,
) -> impl Fn(&Event) + 'static {
    move |_: &Event| {
        let Some(state) = handle.upgrade() else {
            return;
        };
        if let Err(err) = state.update(field, |value| value.as_int().unwrap_or(0) + step) {
            warn!(field, error = %err, "click handler failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn app() -> App {
        App::new(BindingConfig::default(), Instant::now())
    }

    #[test]
    fn initial_state_matches_demo_defaults() {
        let state = initial_state();
        assert_eq!(state.get("price").and_then(|v| v.as_int()), Some(1000));
        assert_eq!(state.get("qty").and_then(|v| v.as_int()), Some(10));
        assert_eq!(state.keys().collect::<Vec<_>>(), ["price", "qty"]);
    }

    #[test]
    fn dropped_binding_makes_handlers_inert() {
        let document = shared(MemoryDocument::new());
        let root = document.borrow_mut().create_element("button");
        let host: SharedDocument = document.clone();
        let binding = ReactiveBinding::new(Rc::clone(&host), initial_state());
        let handler = increment(binding.state().downgrade(), "qty", QTY_STEP);
        document
            .borrow_mut()
            .add_listener(root, "click", Rc::new(handler))
            .unwrap();

        dispatch(&host, root, "click").unwrap();
        assert_eq!(binding.state().get("qty").and_then(|v| v.as_int()), Some(11));

        drop(binding);
        assert_eq!(dispatch(&host, root, "click").unwrap(), 1);
    }

    #[traced_test]
    #[test]
    fn mount_and_click_are_logged() {
        let app = app();
        app.mount().unwrap();
        app.click(QTY_LABEL).unwrap();
        assert!(logs_contain("app mounted"));
        assert!(logs_contain("click"));
    }
}
