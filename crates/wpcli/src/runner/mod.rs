//! Process execution abstraction.
//!
//! The [`Runner`] trait is the only place a real process is started,
//! allowing for different implementations:
//! - [`ProcessRunner`] executes the program on this machine
//! - [`ScriptedRunner`] replays canned replies for tests

pub mod process;
pub mod scripted;

pub use process::ProcessRunner;
pub use scripted::{Reply, ScriptedRunner};

use crate::types::CommandOutput;

/// Executes a program with an argument vector and captures its output.
///
/// Implementations must capture stdout and stderr together and must not
/// treat a non-zero exit as an `Err`: the exit status is reported in
/// [`CommandOutput`]. `Err` is reserved for failing to run the program at all.
pub trait Runner: Send + Sync {
    /// Run `program` with `args` and wait for it to finish.
    fn execute(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput>;
}
