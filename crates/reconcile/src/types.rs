//! Outcome types shared by every reconciler.

use serde::{Deserialize, Serialize};

/// A non-fatal diagnostic attached to a successful operation.
///
/// Used when the site enforces something that blocks the requested change
/// (one theme must always be active). The observed state then reflects what
/// the site actually did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Short headline
    pub summary: String,
    /// What happened and what state was kept
    pub detail: String,
}

impl Warning {
    /// Create a new warning.
    pub fn new(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.summary, self.detail)
    }
}

/// State read back from the site, plus any warnings raised on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed<T> {
    /// Verified state
    pub state: T,
    /// Non-fatal diagnostics
    pub warnings: Vec<Warning>,
}

impl<T> Observed<T> {
    /// Observed state with no warnings.
    pub fn new(state: T) -> Self {
        Self {
            state,
            warnings: Vec::new(),
        }
    }

    /// Observed state with the given warnings.
    pub fn with_warnings(state: T, warnings: Vec<Warning>) -> Self {
        Self { state, warnings }
    }

    /// Observed state with a single warning.
    pub fn warn(state: T, warning: Warning) -> Self {
        Self::with_warnings(state, vec![warning])
    }

    /// Whether any warnings were raised.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Transform the state, keeping the warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Observed<U> {
        Observed {
            state: f(self.state),
            warnings: self.warnings,
        }
    }
}

/// What a delete did on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Removal {
    /// The object is gone from the site
    Removed,
    /// The object still exists on the site; only tracking should be dropped
    LeftInPlace,
}

impl Removal {
    /// Check if the object was removed from the site.
    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

/// Diagnostic class of a finished operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Completed as requested
    Success,
    /// Completed, but the site diverged from the request in a tolerated way
    Warning,
    /// Failed
    Error,
}

impl Outcome {
    /// Classify the result of a reconciler operation.
    pub fn of<T, E>(result: &Result<Observed<T>, E>) -> Self {
        match result {
            Ok(observed) if observed.has_warnings() => Self::Warning,
            Ok(_) => Self::Success,
            Err(_) => Self::Error,
        }
    }

    /// Check if the outcome represents success (no failure).
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Error)
    }
}

/// Activation as verified by a fresh `status` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActivationCheck {
    pub active: bool,
    pub output: String,
}
