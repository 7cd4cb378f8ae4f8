#![forbid(unsafe_code)]

//! The price x quantity demo as a library, so the binary and the tests drive
//! the same code.

pub mod app;
pub mod error;

pub use app::{App, PRICE_LABEL, PRICE_STEP, QTY_LABEL, QTY_STEP, initial_state};
pub use error::DemoError;
