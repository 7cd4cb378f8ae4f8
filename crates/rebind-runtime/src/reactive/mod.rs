#![forbid(unsafe_code)]

//! Reactive binding engine.
//!
//! - [`Value`]: an opaque field payload.
//! - [`State`]: an ordered field-name to [`Value`] mapping supplied at
//!   construction.
//! - [`SubscriberSlot`]: the one-element registry holding the active render
//!   callback.
//! - [`ReactiveBinding`]: couples a state bag, a mount node, and the slot.
//! - [`StateHandle`]: the intercepting accessor used to read and write fields
//!   once a binding owns the state.
//!
//! # Architecture
//!
//! The binding keeps its fields, slot, and counters in one `Rc` shared by every
//! handle. All interior state sits behind `RefCell`/`Cell`, and no borrow is
//! held while a render callback runs, so callbacks may read and write fields
//! freely.
//!
//! # Invariants
//!
//! 1. Exactly one subscriber is active per binding; activation replaces it.
//! 2. Only fields present when `watch` ran are tracked.
//! 3. Every tracked write performs one full clear-and-rebuild, even when the
//!    new value equals the old one.
//! 4. Untracked writes never render.
//! 5. `get` never returns a stale value.

pub mod binding;
pub mod config;
pub mod error;
pub mod state;
pub mod subscriber;
pub mod value;

pub use binding::{BindingBuilder, ReactiveBinding, StateHandle, WeakStateHandle};
pub use config::{BindingConfig, ReentrancyPolicy};
pub use error::{BindingError, RenderCallbackError};
pub use state::State;
pub use subscriber::{IntoRender, RenderFn, RenderResult, SubscriberSlot, render_fn};
pub use value::Value;
