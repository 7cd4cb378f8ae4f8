#![forbid(unsafe_code)]

//! Binding errors.
//!
//! # Failure Modes
//!
//! | Failure | Raised by | Binding state afterwards |
//! |---------|-----------|--------------------------|
//! | `InvalidCallback` | `activate_any` | Unchanged |
//! | `RenderCallback` | `render`, `watch`, tracked `set` | Mount target already cleared |
//! | `Host` | `render` | Unchanged (clear failed first) |
//! | `ReentrantRender` | tracked `set` under `Reject` | Value not stored |
//! | `RenderDepthExceeded` | nested `render` | Outer render continues unwinding |
//!
//! Nothing is retried or rolled back.

use std::error::Error;

use rebind_dom::DomError;

/// Why a render callback's cycle failed after the mount target was cleared.
#[derive(Debug)]
pub enum RenderCallbackError {
    /// The callback itself returned an error.
    Callback(Box<dyn Error>),
    /// The callback's output could not be attached to the mount target.
    Attach(DomError),
}

impl std::fmt::Display for RenderCallbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Callback(err) => write!(f, "render callback failed: {err}"),
            Self::Attach(err) => write!(f, "render output could not be attached: {err}"),
        }
    }
}

impl Error for RenderCallbackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Callback(err) => Some(err.as_ref()),
            Self::Attach(err) => Some(err),
        }
    }
}

/// Errors from binding operations.
#[derive(Debug)]
pub enum BindingError {
    /// A dynamically supplied subscriber was not a render callback.
    InvalidCallback,
    /// The render cycle failed inside or right after the callback.
    RenderCallback(RenderCallbackError),
    /// The host document refused to clear the mount target.
    Host(DomError),
    /// A tracked field was written during its binding's own render while the
    /// binding rejects re-entrant writes.
    ReentrantRender { field: String },
    /// Nested renders exceeded the configured depth.
    RenderDepthExceeded { limit: usize },
}

impl std::fmt::Display for BindingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCallback => write!(f, "subscriber must be a render callback"),
            Self::RenderCallback(err) => std::fmt::Display::fmt(err, f),
            Self::Host(err) => write!(f, "mount target could not be cleared: {err}"),
            Self::ReentrantRender { field } => {
                write!(f, "field '{field}' written during an in-flight render")
            }
            Self::RenderDepthExceeded { limit } => {
                write!(f, "render nesting exceeded {limit} levels")
            }
        }
    }
}

impl Error for BindingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RenderCallback(err) => Some(err),
            Self::Host(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RenderCallbackError> for BindingError {
    fn from(err: RenderCallbackError) -> Self {
        Self::RenderCallback(err)
    }
}
