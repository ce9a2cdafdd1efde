//! Argument assembly for wp-cli.
//!
//! Connection-scoping flags must precede the command, so the vector is
//! always built in the same order: `--ssh`, `--allow-root`, `--path`, then
//! the caller's arguments verbatim.

use crate::types::ConnectionProfile;

/// Build the full wp-cli argument vector for a profile.
///
/// Flags whose profile field is empty (or false) are omitted. The resource
/// arguments are appended unchanged and are not validated.
pub fn build_args<S: AsRef<str>>(profile: &ConnectionProfile, resource_args: &[S]) -> Vec<String> {
    let mut args = Vec::with_capacity(resource_args.len() + 3);

    if !profile.ssh_target.is_empty() {
        args.push(format!("--ssh={}", profile.ssh_target));
    }

    if profile.allow_root {
        args.push("--allow-root".to_string());
    }

    if !profile.remote_path.is_empty() {
        args.push(format!("--path={}", profile.remote_path));
    }

    args.extend(resource_args.iter().map(|a| a.as_ref().to_string()));
    args
}

/// Flags whose values must never be printed.
const SECRET_FLAGS: [&str; 2] = ["--user_pass=", "--password="];

/// Space-joined argument vector for logs and messages, with secret flag
/// values masked.
pub fn display_args<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| {
            let arg = arg.as_ref();
            match SECRET_FLAGS.iter().find(|flag| arg.starts_with(*flag)) {
                Some(flag) => format!("{flag}***"),
                None => arg.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
