//! Scripted runner for tests.
//!
//! Replies are registered against an argument suffix (the resource
//! arguments, without connection flags). Each rule holds a queue of
//! replies: every matching call consumes one, and the last reply keeps
//! answering once the queue is down to it. Every call is recorded so tests
//! can assert on exactly what was issued.

use crate::runner::Runner;
use crate::types::CommandOutput;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A canned reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    output: String,
    exit_code: Option<i32>,
}

impl Reply {
    /// Successful exit with the given output.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(0),
        }
    }

    /// Exit code 1 with the given output.
    pub fn fail(output: impl Into<String>) -> Self {
        Self::exit(1, output)
    }

    /// Arbitrary exit code with the given output.
    pub fn exit(code: i32, output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(code),
        }
    }

    fn to_output(&self) -> CommandOutput {
        match self.exit_code {
            Some(0) => CommandOutput::ok(self.output.clone()),
            Some(code) => CommandOutput::failed(code, self.output.clone()),
            None => CommandOutput {
                output: self.output.clone().into_bytes(),
                exit_code: None,
                success: false,
            },
        }
    }
}

struct Rule {
    suffix: Vec<String>,
    replies: VecDeque<Reply>,
}

/// Runner that answers from a script instead of starting processes.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    /// Create an empty script. Unmatched calls fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer calls ending in `suffix` with `reply`.
    ///
    /// Registering the same suffix again queues another reply behind the
    /// existing ones.
    pub fn on(self, suffix: &[&str], reply: Reply) -> Self {
        self.push(suffix, reply);
        self
    }

    /// Queue a reply on an existing runner (e.g. one shared through an `Arc`).
    pub fn push(&self, suffix: &[&str], reply: Reply) {
        let suffix: Vec<String> = suffix.iter().map(ToString::to_string).collect();
        let mut rules = lock(&self.rules);
        if let Some(rule) = rules.iter_mut().find(|r| r.suffix == suffix) {
            rule.replies.push_back(reply);
        } else {
            rules.push(Rule {
                suffix,
                replies: VecDeque::from([reply]),
            });
        }
    }

    /// Every argument vector executed so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        lock(&self.calls).clone()
    }

    /// Calls whose arguments end with `suffix`.
    pub fn calls_matching(&self, suffix: &[&str]) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|args| ends_with(args, suffix))
            .count()
    }

    /// Whether any call contained all of `words` as consecutive arguments.
    /// Empty `words` never matches.
    pub fn was_called_with(&self, words: &[&str]) -> bool {
        if words.is_empty() {
            return false;
        }
        lock(&self.calls).iter().any(|args| {
            args.windows(words.len())
                .any(|w| w.iter().zip(words).all(|(a, b)| a == b))
        })
    }
}

impl Runner for ScriptedRunner {
    fn execute(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        lock(&self.calls).push(args.to_vec());

        let mut rules = lock(&self.rules);
        // longest suffix wins so specific rules can shadow general ones
        let rule = rules
            .iter_mut()
            .filter(|r| ends_with(args, &r.suffix))
            .max_by_key(|r| r.suffix.len());

        match rule {
            Some(rule) => {
                let reply = if rule.replies.len() > 1 {
                    rule.replies.pop_front()
                } else {
                    rule.replies.front().cloned()
                };
                Ok(reply.map_or_else(CommandOutput::default, |r| r.to_output()))
            }
            None => Ok(CommandOutput::failed(
                1,
                format!("no scripted reply for: {program} {}", args.join(" ")),
            )),
        }
    }
}

fn ends_with<S: AsRef<str>>(args: &[String], suffix: &[S]) -> bool {
    suffix.len() <= args.len()
        && args[args.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, s)| a == s.as_ref())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_replies_in_order_then_repeat_last() {
        let runner = ScriptedRunner::new()
            .on(&["plugin", "status", "akismet"], Reply::ok("Status: Active"))
            .on(&["plugin", "status", "akismet"], Reply::ok("Status: Inactive"));

        let args = strings(&["--path=/srv", "plugin", "status", "akismet"]);
        assert_eq!(runner.execute("wp", &args).unwrap().text(), "Status: Active");
        assert_eq!(runner.execute("wp", &args).unwrap().text(), "Status: Inactive");
        assert_eq!(runner.execute("wp", &args).unwrap().text(), "Status: Inactive");
        assert_eq!(runner.calls().len(), 3);
        assert_eq!(runner.calls_matching(&["status", "akismet"]), 3);
    }

    #[test]
    fn test_unmatched_call_fails() {
        let runner = ScriptedRunner::new();
        let out = runner
            .execute("wp", &strings(&["plugin", "delete", "x"]))
            .unwrap();
        assert!(!out.success);
        assert!(out.text().contains("plugin delete x"));
    }

    #[test]
    fn test_longest_suffix_wins() {
        let runner = ScriptedRunner::new()
            .on(&["x"], Reply::fail("short"))
            .on(&["delete", "x"], Reply::ok("long"));
        let out = runner
            .execute("wp", &strings(&["plugin", "delete", "x"]))
            .unwrap();
        assert!(out.success);
        assert_eq!(out.text(), "long");
    }

    #[test]
    fn test_was_called_with() {
        let runner = ScriptedRunner::new().on(&["install", "akismet"], Reply::ok(""));
        runner
            .execute("wp", &strings(&["--allow-root", "plugin", "install", "akismet"]))
            .unwrap();
        assert!(runner.was_called_with(&["plugin", "install"]));
        assert!(!runner.was_called_with(&["plugin", "delete"]));
    }

    #[test]
    fn test_was_called_with_nothing() {
        let runner = ScriptedRunner::new().on(&["list"], Reply::ok(""));
        runner.execute("wp", &strings(&["plugin", "list"])).unwrap();
        assert!(!runner.was_called_with(&[]));
    }
}
