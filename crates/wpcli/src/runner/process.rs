//! Runner that spawns real processes.

use crate::runner::Runner;
use crate::types::CommandOutput;
use std::process::{Command, Stdio};

/// Runner that executes commands with `std::process`.
///
/// Calls block until the process exits; there is no internal timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new ProcessRunner.
    pub fn new() -> Self {
        Self
    }
}

impl Runner for ProcessRunner {
    fn execute(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        // wp-cli writes warnings to stderr even on success; callers want all of it
        let mut combined = output.stdout;
        if !output.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with(b"\n") {
                combined.push(b'\n');
            }
            combined.extend_from_slice(&output.stderr);
        }

        Ok(CommandOutput {
            output: combined,
            exit_code: output.status.code(),
            success: output.status.success(),
        })
    }
}
