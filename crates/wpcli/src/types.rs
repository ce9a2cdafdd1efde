//! Core types for wp-cli invocations.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how to reach a WordPress installation.
///
/// Every field is optional in the sense that an empty value means
/// "let wp-cli use its default": an empty `ssh_target` runs locally, an
/// empty `remote_path` uses the tool's working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Value for `--ssh=` (e.g. `user@host`, `docker:container`)
    #[serde(default)]
    pub ssh_target: String,
    /// Value for `--path=` on the target system
    #[serde(default)]
    pub remote_path: String,
    /// Whether to pass `--allow-root`
    #[serde(default)]
    pub allow_root: bool,
}

impl ConnectionProfile {
    /// Create a profile that runs wp-cli locally with all defaults.
    pub fn local() -> Self {
        Self::default()
    }

    /// Set the ssh target.
    pub fn with_ssh_target(mut self, target: impl Into<String>) -> Self {
        self.ssh_target = target.into();
        self
    }

    /// Set the installation path.
    pub fn with_remote_path(mut self, path: impl Into<String>) -> Self {
        self.remote_path = path.into();
        self
    }

    /// Set the `--allow-root` flag.
    pub fn with_allow_root(mut self, allow: bool) -> Self {
        self.allow_root = allow;
        self
    }

    /// Whether commands run on the local machine.
    pub fn is_local(&self) -> bool {
        self.ssh_target.is_empty()
    }

    /// Short human-readable label for log lines and CLI output.
    pub fn label(&self) -> String {
        let target = if self.is_local() {
            "local"
        } else {
            self.ssh_target.as_str()
        };
        if self.remote_path.is_empty() {
            target.to_string()
        } else {
            format!("{target}:{}", self.remote_path)
        }
    }
}

impl std::fmt::Display for ConnectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Raw result of executing a process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// stdout followed by stderr
    pub output: Vec<u8>,
    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,
    /// Whether the process exited successfully
    pub success: bool,
}

impl CommandOutput {
    /// A successful exit with the given output.
    pub fn ok(output: impl Into<Vec<u8>>) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(0),
            success: true,
        }
    }

    /// A failed exit with the given code and output.
    pub fn failed(code: i32, output: impl Into<Vec<u8>>) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(code),
            success: false,
        }
    }

    /// Output decoded as (lossy) UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).to_string()
    }
}

/// One wp-cli invocation: the full argument vector and what came back.
///
/// Produced by [`Client::run_captured`](crate::Client::run_captured). The
/// output is kept even when the call failed so callers can attach it to
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program that was executed
    pub program: String,
    /// Full argument vector, connection flags included
    pub args: Vec<String>,
    /// Combined stdout and stderr
    pub output: String,
    /// Exit code; `None` if the process could not be spawned or was killed
    pub exit_code: Option<i32>,
    /// Whether the tool reported success
    pub success: bool,
}

impl Invocation {
    /// Convert into the raw output, or a [`ToolFailure`](crate::Error::ToolFailure).
    pub fn check(self) -> crate::Result<String> {
        if self.success {
            Ok(self.output)
        } else {
            Err(self.into_error())
        }
    }

    /// Build the failure error for this invocation regardless of its status.
    pub fn into_error(self) -> crate::Error {
        crate::Error::ToolFailure {
            program: self.program,
            args: self.args,
            exit_code: self.exit_code,
            output: self.output,
        }
    }

    /// Space-joined argument vector with secrets masked, for messages.
    pub fn command_line(&self) -> String {
        format!("{} {}", self.program, crate::args::display_args(&self.args))
    }
}

/// Answer of an existence check (`plugin is-installed`, `user get`, ...)
/// along with what the tool printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    /// Whether the object exists
    pub present: bool,
    /// Raw output of the check
    pub output: String,
}

/// How long to wait for the site to catch up after a mutating call.
///
/// WordPress applies some changes (activation in particular) after the
/// wp-cli call returns, so state is re-read after a delay. With
/// `max_polls > 1` the re-read is repeated with exponential backoff until
/// the expected value shows up.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleConfig {
    /// Delay before the first re-read
    pub delay: Duration,
    /// Maximum number of re-reads
    pub max_polls: u32,
    /// Multiplier applied to the delay for each additional re-read
    pub backoff_factor: f64,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
            max_polls: 1,
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl SettleConfig {
    /// Single re-read after a fixed delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    /// No waiting at all (tests, or sites known to apply changes synchronously).
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            max_polls: 1,
            backoff_factor: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Allow up to `polls` re-reads.
    pub fn with_polls(mut self, polls: u32) -> Self {
        self.max_polls = polls.max(1);
        self
    }

    /// Set the backoff multiplier. Anything below 1.0 (or not a number)
    /// means no backoff.
    pub fn with_backoff(mut self, factor: f64) -> Self {
        self.backoff_factor = Self::usable_factor(factor);
        self
    }

    /// Delay before the given re-read (0-indexed).
    ///
    /// Never shorter than `delay` and never longer than the larger of
    /// `delay` and `max_delay`.
    pub fn delay_for_poll(&self, poll: u32) -> Duration {
        let ceiling = self.delay.max(self.max_delay);
        let factor = Self::usable_factor(self.backoff_factor);
        let delay = self.delay.as_secs_f64() * factor.powi(i32::try_from(poll).unwrap_or(i32::MAX));

        match Duration::try_from_secs_f64(delay) {
            Ok(delay) => delay.clamp(self.delay, ceiling),
            Err(_) => ceiling,
        }
    }

    fn usable_factor(factor: f64) -> f64 {
        if factor.is_finite() { factor.max(1.0) } else { 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_label() {
        assert_eq!(ConnectionProfile::local().label(), "local");
        let profile = ConnectionProfile::local()
            .with_ssh_target("docker:wordpress")
            .with_remote_path("/var/www/html");
        assert_eq!(profile.label(), "docker:wordpress:/var/www/html");
        assert!(!profile.is_local());
    }

    #[test]
    fn test_invocation_check() {
        let ok = Invocation {
            program: "wp".to_string(),
            args: vec!["option".to_string(), "get".to_string()],
            output: "value".to_string(),
            exit_code: Some(0),
            success: true,
        };
        assert_eq!(ok.clone().check().unwrap(), "value");

        let failed = Invocation {
            success: false,
            exit_code: Some(1),
            output: "Error: nope".to_string(),
            ..ok
        };
        let err = failed.check().unwrap_err();
        assert!(err.to_string().contains("option get"));
        assert!(err.to_string().contains("Error: nope"));
    }

    #[test]
    fn test_settle_delay() {
        let config = SettleConfig::new(Duration::from_secs(2)).with_polls(4);

        assert_eq!(config.delay_for_poll(0), Duration::from_secs(2));
        assert_eq!(config.delay_for_poll(1), Duration::from_secs(4));
        assert_eq!(config.delay_for_poll(2), Duration::from_secs(8));
    }

    #[test]
    fn test_settle_max_delay() {
        let config = SettleConfig {
            max_delay: Duration::from_secs(5),
            ..SettleConfig::new(Duration::from_secs(2)).with_polls(5)
        };

        assert_eq!(config.delay_for_poll(2), Duration::from_secs(5));
        assert_eq!(config.delay_for_poll(3), Duration::from_secs(5));
    }

    #[test]
    fn test_settle_negative_backoff_does_not_shrink() {
        let config = SettleConfig::new(Duration::from_secs(2)).with_polls(2).with_backoff(-2.0);
        assert!((config.backoff_factor - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.delay_for_poll(1), Duration::from_secs(2));

        // Set directly, bypassing the builder
        let raw = SettleConfig {
            backoff_factor: -2.0,
            ..SettleConfig::new(Duration::from_secs(2)).with_polls(3)
        };
        assert_eq!(raw.delay_for_poll(1), Duration::from_secs(2));
        assert_eq!(raw.delay_for_poll(2), Duration::from_secs(2));

        let nan = SettleConfig {
            backoff_factor: f64::NAN,
            ..SettleConfig::new(Duration::from_secs(2))
        };
        assert_eq!(nan.delay_for_poll(4), Duration::from_secs(2));
    }

    #[test]
    fn test_settle_huge_delay_is_capped() {
        let config = SettleConfig::new(Duration::from_secs(u64::MAX / 2)).with_polls(3);
        assert_eq!(config.delay_for_poll(2), Duration::from_secs(u64::MAX / 2));

        let runaway = SettleConfig::new(Duration::from_secs(1))
            .with_polls(u32::MAX)
            .with_backoff(1e300);
        assert_eq!(runaway.delay_for_poll(5), Duration::from_secs(30));
    }

    #[test]
    fn test_settle_immediate() {
        let config = SettleConfig::immediate();
        assert_eq!(config.delay_for_poll(0), Duration::ZERO);
        assert_eq!(config.delay_for_poll(3), Duration::ZERO);
        assert_eq!(config.with_polls(0).max_polls, 1);
    }
}
