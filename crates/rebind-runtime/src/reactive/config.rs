#![forbid(unsafe_code)]

//! Binding configuration.
//!
//! The defaults reproduce plain unguarded behavior: a tracked write made by a
//! render callback re-enters `render` immediately, with no depth limit.

use std::str::FromStr;

/// What happens when a tracked field is written while its own binding is
/// mid-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum ReentrancyPolicy {
    /// Store the value and render again before the outer render returns.
    #[default]
    Recurse,
    /// Refuse the write with
    /// [`BindingError::ReentrantRender`](super::BindingError::ReentrantRender).
    Reject,
}

impl std::fmt::Display for ReentrancyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Recurse => "recurse",
            Self::Reject => "reject",
        })
    }
}

impl FromStr for ReentrancyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recurse" => Ok(Self::Recurse),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown reentrancy policy: {other}")),
        }
    }
}

/// Per-binding settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct BindingConfig {
    pub reentrancy: ReentrancyPolicy,
    /// Maximum number of nested render cycles (the outermost counts as one).
    /// `None` is unbounded. Values below 1 are treated as 1.
    pub max_render_depth: Option<usize>,
}

impl BindingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reentrancy(mut self, policy: ReentrancyPolicy) -> Self {
        self.reentrancy = policy;
        self
    }

    #[must_use]
    pub fn with_max_render_depth(mut self, depth: usize) -> Self {
        self.max_render_depth = Some(depth);
        self
    }

    /// Effective depth limit, if any.
    #[must_use]
    pub(crate) fn depth_limit(&self) -> Option<usize> {
        self.max_render_depth.map(|depth| depth.max(1))
    }
}
