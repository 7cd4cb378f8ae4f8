#![forbid(unsafe_code)]

//! Reactive state-to-view bindings.
//!
//! A [`ReactiveBinding`] wraps a [`State`] bag and a mount node in a host
//! document. Every write to a tracked field clears the mount node and rebuilds
//! it from the binding's single render callback.
//!
//! ```
//! use rebind_dom::{MemoryDocument, SharedDocument, el, shared};
//! use rebind_runtime::{ReactiveBinding, State};
//!
//! let doc = shared(MemoryDocument::new());
//! let host: SharedDocument = doc.clone();
//! let binding = ReactiveBinding::new(host, State::new().with("count", 0));
//!
//! let mount = binding
//!     .watch(|state| el("p").child(state.get("count").unwrap_or_default().to_string()))
//!     .unwrap();
//! assert_eq!(doc.borrow().inner_html(mount).unwrap(), "<p>0</p>");
//!
//! binding.state().set("count", 5).unwrap();
//! assert_eq!(doc.borrow().inner_html(mount).unwrap(), "<p>5</p>");
//! ```

pub mod reactive;

pub use reactive::{
    BindingBuilder, BindingConfig, BindingError, IntoRender, ReactiveBinding, ReentrancyPolicy,
    RenderCallbackError, RenderFn, RenderResult, State, StateHandle, SubscriberSlot, Value,
    WeakStateHandle, render_fn,
};
