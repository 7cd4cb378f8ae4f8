#![forbid(unsafe_code)]

use rebind_dom::DomError;
use rebind_runtime::BindingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("binding failed: {0}")]
    Binding(#[from] BindingError),

    #[error("document error: {0}")]
    Dom(#[from] DomError),

    #[error("no button labelled '{0}'")]
    MissingButton(String),

    #[error("app is not mounted")]
    NotMounted,
}
