//! Reconciler errors.
//!
//! Two kinds of failure are fatal once a tool has run: the tool itself
//! failed, or it claimed success and a follow-up read disagreed. A desired
//! state that cannot be applied at all is rejected before any call.
//! Conflicts with invariants the site enforces are warnings instead (see
//! [`Warning`](crate::Warning)), and an object that no longer exists is
//! `Ok(None)` from `read`.

use thiserror::Error;
use wpcli::ErrorCategory;

/// Errors returned by reconciler operations.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A wp-cli call exited non-zero
    #[error("{summary}: {source}")]
    Tool {
        /// What the reconciler was trying to do
        summary: String,
        /// The failed invocation, with arguments and raw output
        source: wpcli::Error,
    },

    /// The tool reported success but the site does not show the result
    #[error("{summary}: {detail}{}", with_output(.output))]
    Verification {
        /// Headline
        summary: String,
        /// What was expected and what was observed
        detail: String,
        /// Raw output of the verifying call
        output: String,
    },

    /// The desired state is missing something the operation needs
    #[error("{summary}: {detail}")]
    Invalid {
        /// Headline
        summary: String,
        /// What is missing
        detail: String,
    },
}

fn with_output(output: &str) -> String {
    let output = output.trim_end();
    if output.trim().is_empty() {
        String::new()
    } else {
        format!("\n{output}")
    }
}

impl ReconcileError {
    /// Adapter for `map_err` that wraps a tool failure under a summary.
    pub fn tool(summary: &str) -> impl FnOnce(wpcli::Error) -> Self + '_ {
        move |source| Self::Tool {
            summary: summary.to_string(),
            source,
        }
    }

    /// Build a verification failure.
    pub fn verification(
        summary: impl Into<String>,
        detail: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::Verification {
            summary: summary.into(),
            detail: detail.into(),
            output: output.into(),
        }
    }

    /// Build a failure for a desired state that cannot be applied as given.
    pub fn invalid(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Invalid {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Headline of the failure.
    pub fn summary(&self) -> &str {
        match self {
            Self::Tool { summary, .. } | Self::Verification { summary, .. } | Self::Invalid { summary, .. } => {
                summary
            }
        }
    }

    /// Literal tool output behind the failure. Empty when no tool ran.
    pub fn output(&self) -> &str {
        match self {
            Self::Tool { source, .. } => source.output(),
            Self::Verification { output, .. } => output,
            Self::Invalid { .. } => "",
        }
    }

    /// Classification of the underlying tool failure, if there was one.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Tool { source, .. } => Some(source.category()),
            Self::Verification { .. } | Self::Invalid { .. } => None,
        }
    }
}

/// Result type for reconciler operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_failure() -> wpcli::Error {
        wpcli::Error::ToolFailure {
            program: "wp".to_string(),
            args: vec!["plugin".into(), "install".into(), "akismet".into()],
            exit_code: Some(1),
            output: "Error: download failed".to_string(),
        }
    }

    #[test]
    fn test_tool_error_message() {
        let err = ReconcileError::tool("Failed to install plugin")(tool_failure());
        let msg = err.to_string();

        assert!(msg.starts_with("Failed to install plugin"));
        assert!(msg.contains("plugin install akismet"));
        assert!(msg.contains("Error: download failed"));
        assert_eq!(err.summary(), "Failed to install plugin");
        assert_eq!(err.output(), "Error: download failed");
        assert_eq!(err.category(), Some(ErrorCategory::Other));
    }

    #[test]
    fn test_verification_error() {
        let err = ReconcileError::verification(
            "Plugin not installed after install attempt",
            "akismet is not reported as installed",
            "",
        );
        assert_eq!(
            err.to_string(),
            "Plugin not installed after install attempt: akismet is not reported as installed"
        );
        assert_eq!(err.category(), None);
    }

    #[test]
    fn test_verification_message_includes_output() {
        let err = ReconcileError::verification(
            "Plugin is still active after deactivation",
            "akismet reports active after an explicit deactivate",
            "Plugin akismet details:\n    Status: Active\n",
        );

        assert_eq!(
            err.to_string(),
            "Plugin is still active after deactivation: akismet reports active after an explicit deactivate\n\
             Plugin akismet details:\n    Status: Active"
        );
    }
}
