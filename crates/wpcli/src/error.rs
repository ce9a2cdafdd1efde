//! Error types for wp-cli invocations.
//!
//! wp-cli has no machine-readable error channel in the modes used here, so
//! every failure keeps the literal tool output. [`ErrorCategory`] is a
//! best-effort classification of that output, used to tell "the thing is
//! not there" apart from "the tool could not be reached".

use thiserror::Error;

/// Categories of wp-cli failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// ssh/docker transport failure or tool not runnable (transient, retryable)
    Connection,
    /// Plugin, theme, option or user does not exist
    NotFound,
    /// The thing being created already exists
    AlreadyExists,
    /// Filesystem or root-user permission problem
    Permission,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection)
    }

    /// Whether the failure means the target simply does not exist.
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Connection => "Could not reach the WordPress install",
            Self::NotFound => "Not found",
            Self::AlreadyExists => "Already exists",
            Self::Permission => "Permission denied",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Connection => {
                "Check the ssh target, that wp-cli is installed there, and that the host is reachable"
            }
            Self::NotFound => "Verify the slug, option name or username",
            Self::AlreadyExists => "Import the existing object into tracked state instead of creating it",
            Self::Permission => {
                "Check file ownership on the install, or enable allow_root when running as root"
            }
            Self::Other => "Check the tool output for more information",
        }
    }

    /// Classify raw wp-cli output.
    pub fn from_output(output: &str, exit_code: Option<i32>) -> Self {
        let lower = output.to_lowercase();

        // ssh exits with 255 on transport errors; no exit code means spawn failure
        if exit_code.is_none()
            || exit_code == Some(255)
            || lower.contains("could not resolve hostname")
            || lower.contains("connection refused")
            || lower.contains("connection timed out")
            || lower.contains("no route to host")
            || lower.contains("permission denied (publickey")
            || lower.contains("error establishing a database connection")
            || lower.contains("command not found")
            || lower.contains("no such container")
        {
            return Self::Connection;
        }

        if lower.contains("yikes! it looks like you're running this as root")
            || lower.contains("permission denied")
            || lower.contains("could not create directory")
            || lower.contains("operation not permitted")
        {
            return Self::Permission;
        }

        if lower.contains("already exists")
            || lower.contains("already installed")
            || lower.contains("username is already registered")
            || lower.contains("email address is already registered")
        {
            return Self::AlreadyExists;
        }

        if lower.contains("could not find")
            || lower.contains("could not be found")
            || lower.contains("not found")
            || lower.contains("does it exist?")
            || lower.contains("does not exist")
            || lower.contains("is not installed")
            || lower.contains("invalid user id")
            || lower.contains("invalid plugin slug")
            || lower.contains("the theme cannot be found")
        {
            return Self::NotFound;
        }

        Self::Other
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while running wp-cli.
#[derive(Debug, Error)]
pub enum Error {
    /// The tool exited non-zero (or could not be started)
    #[error("{program} {} failed: {output}", crate::args::display_args(.args))]
    ToolFailure {
        /// Program that was executed
        program: String,
        /// Full argument vector
        args: Vec<String>,
        /// Exit code, if any
        exit_code: Option<i32>,
        /// Combined stdout and stderr
        output: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ToolFailure {
                output, exit_code, ..
            } => ErrorCategory::from_output(output, *exit_code),
            Error::Io(_) => ErrorCategory::Connection,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Raw tool output attached to this error, if any.
    pub fn output(&self) -> &str {
        match self {
            Error::ToolFailure { output, .. } => output,
            Error::Io(_) => "",
        }
    }
}

/// Result type for wp-cli operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(args: &[&str], output: &str) -> Error {
        Error::ToolFailure {
            program: "wp".to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            exit_code: Some(1),
            output: output.to_string(),
        }
    }

    #[test]
    fn test_tool_failure_message() {
        let err = failure(&["plugin", "install", "akismet"], "error occurred");
        let msg = err.to_string();
        assert!(msg.contains("wp"));
        assert!(msg.contains("plugin install akismet"));
        assert!(msg.contains("error occurred"));
    }

    #[test]
    fn test_tool_failure_hides_password() {
        let err = failure(&["user", "create", "bob", "bob@example.com", "--user_pass=hunter2"], "Error: exists");
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_category_connection() {
        assert_eq!(
            ErrorCategory::from_output("ssh: Could not resolve hostname web1", Some(255)),
            ErrorCategory::Connection
        );
        assert_eq!(
            ErrorCategory::from_output("failed to execute wp", None),
            ErrorCategory::Connection
        );
        assert!(ErrorCategory::Connection.is_retryable());
    }

    #[test]
    fn test_category_not_found() {
        let err = failure(
            &["user", "get", "bob"],
            "Error: Invalid user ID, email or login: 'bob'",
        );
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.category().is_absence());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_category_permission() {
        let err = failure(
            &["plugin", "list"],
            "Error: YIKES! It looks like you're running this as root.",
        );
        assert_eq!(err.category(), ErrorCategory::Permission);
    }

    #[test]
    fn test_category_already_exists() {
        let err = failure(
            &["user", "create", "bob", "bob@example.com"],
            "Error: Sorry, that username already exists!",
        );
        assert_eq!(err.category(), ErrorCategory::AlreadyExists);
    }

    #[test]
    fn test_category_other() {
        assert_eq!(
            ErrorCategory::from_output("", Some(1)),
            ErrorCategory::Other
        );
    }
}
