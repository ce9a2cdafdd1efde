//! # wpcli
//!
//! Blocking driver for the `wp` command-line tool.
//!
//! This crate provides functionality for:
//! - Building wp-cli argument vectors from a [`ConnectionProfile`]
//! - Running wp-cli through a swappable [`Runner`](runner::Runner)
//! - Interpreting the free-text `status` output of plugins and themes
//! - Classifying failures from their raw output
//! - Waiting for the site to settle after a mutation
//!
//! ## Example
//!
//! ```no_run
//! use wpcli::{Client, ConnectionProfile, status};
//!
//! let client = Client::new();
//! let profile = ConnectionProfile::local()
//!     .with_ssh_target("deploy@web1")
//!     .with_remote_path("/var/www/html");
//!
//! client.run(&profile, &["plugin", "install", "akismet"]).expect("install failed");
//!
//! let output = client
//!     .run_captured(&profile, &["plugin", "status", "akismet"])
//!     .check()
//!     .expect("status failed");
//! println!("active: {}", status::is_plugin_active(&output, "akismet"));
//! ```
//!
//! ## Testing
//!
//! Nothing here starts a process directly. Swap in a
//! [`ScriptedRunner`](runner::ScriptedRunner) with [`Client::with_runner`]
//! to replay canned wp-cli output.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod args;
pub mod error;
pub mod runner;
pub mod settle;
pub mod status;
pub mod types;

pub use args::{build_args, display_args};
pub use error::{Error, ErrorCategory, Result};
pub use types::{CommandOutput, ConnectionProfile, Invocation, Presence, SettleConfig};

use runner::{ProcessRunner, Runner};
use std::sync::Arc;

/// Default program name.
pub const DEFAULT_PROGRAM: &str = "wp";

/// High-level client for wp-cli.
///
/// Holds the runner and the program name; the connection profile is passed
/// with every call so one client can serve several sites.
#[derive(Clone)]
pub struct Client {
    runner: Arc<dyn Runner>,
    program: String,
}

impl Client {
    /// Create a client that runs `wp` as a real process.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(ProcessRunner::new()))
    }

    /// Create a client with a custom runner (useful for testing).
    pub fn with_runner(runner: Arc<dyn Runner>) -> Self {
        Self {
            runner,
            program: DEFAULT_PROGRAM.to_string(),
        }
    }

    /// Use a different executable (e.g. `/usr/local/bin/wp` or `wp-cli.phar`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// The executable this client runs.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run a mutating command where only success matters.
    ///
    /// On a non-zero exit the error carries the full argument vector and
    /// the raw output.
    pub fn run<S: AsRef<str>>(&self, profile: &ConnectionProfile, args: &[S]) -> Result<()> {
        let invocation = self.run_captured(profile, args);
        if invocation.success {
            log::info!("{}", invocation.command_line());
        }
        invocation.check().map(|_| ())
    }

    /// Run a command and keep its output whatever the outcome.
    ///
    /// Never fails: a process that cannot be started is reported as an
    /// unsuccessful invocation with no exit code and the spawn error as its
    /// output.
    pub fn run_captured<S: AsRef<str>>(&self, profile: &ConnectionProfile, args: &[S]) -> Invocation {
        let args = build_args(profile, args);
        log::debug!("executing: {} {}", self.program, display_args(&args));

        let (output, exit_code, success) = match self.runner.execute(&self.program, &args) {
            Ok(out) => (out.text(), out.exit_code, out.success),
            Err(e) => (format!("failed to execute {}: {e}", self.program), None, false),
        };

        log::debug!("exit {exit_code:?}, output: {}", output.trim_end());

        Invocation {
            program: self.program.clone(),
            args,
            output,
            exit_code,
            success,
        }
    }

    /// Run a command and return its output, failing on a non-zero exit.
    pub fn output<S: AsRef<str>>(&self, profile: &ConnectionProfile, args: &[S]) -> Result<String> {
        self.run_captured(profile, args).check()
    }

    /// Existence probe (`plugin is-installed`, `user get`, ...).
    ///
    /// Success means present. Exit code 1 means absent, unless the output
    /// shows the tool could not do its job (unreachable host, permission
    /// problem). Anything else is an error: an existence check that could
    /// not be performed is never read as "absent".
    pub fn exists<S: AsRef<str>>(&self, profile: &ConnectionProfile, args: &[S]) -> Result<bool> {
        self.presence(profile, args).map(|presence| presence.present)
    }

    /// Like [`Client::exists`], but keeps the output of the check.
    pub fn presence<S: AsRef<str>>(&self, profile: &ConnectionProfile, args: &[S]) -> Result<Presence> {
        let invocation = self.run_captured(profile, args);
        if invocation.success {
            return Ok(Presence {
                present: true,
                output: invocation.output,
            });
        }

        let category = ErrorCategory::from_output(&invocation.output, invocation.exit_code);
        let absent = invocation.exit_code == Some(1)
            && !matches!(category, ErrorCategory::Connection | ErrorCategory::Permission);

        if absent {
            log::debug!("{} reports absent", invocation.command_line());
            Ok(Presence {
                present: false,
                output: invocation.output,
            })
        } else {
            Err(invocation.into_error())
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}
