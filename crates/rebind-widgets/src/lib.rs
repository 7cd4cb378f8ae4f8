#![forbid(unsafe_code)]

//! View components for rebind.
//!
//! - [`button()`]: a stateless button; all behavior comes from its arguments.
//! - [`Clock`]: a stateful date display that owns its own binding and is
//!   advanced by an external [`Interval`].

pub mod button;
pub mod clock;
pub mod interval;

pub use button::button;
pub use clock::{Clock, TimeSource};
pub use interval::Interval;
