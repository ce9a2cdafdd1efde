//! Replacement search for the active theme.
//!
//! WordPress always has exactly one active theme and wp-cli has no
//! `theme deactivate`. The only way to take a theme out of the active slot
//! is to activate another one. This module finds that other theme.
//!
//! The search never fails: when no candidate can be activated it says so and
//! the caller downgrades the request to a warning.

use wpcli::{Client, ConnectionProfile};

/// Themes tried, in order, when a theme has to be deleted while active.
pub const DEFAULT_FALLBACK_THEMES: [&str; 3] =
    ["twentytwentyfour", "twentytwentythree", "twentytwentytwo"];

/// Where replacement candidates come from.
#[derive(Debug, Clone, Copy)]
pub enum Candidates<'a> {
    /// Installed themes wp-cli lists as inactive, in listing order
    Discovered,
    /// A fixed preference list; each entry is checked for installation first
    Preferred(&'a [String]),
}

/// Result of the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// This theme was activated in place of the target
    Activated(String),
    /// Nothing could be activated
    Unavailable {
        /// Why not, for the warning detail
        reason: String,
    },
}

/// Activate some theme other than `target`.
///
/// Candidates equal to `target` are skipped. The first candidate whose
/// activation succeeds wins; a failed activation moves on to the next one.
pub fn activate_replacement(
    client: &Client,
    profile: &ConnectionProfile,
    target: &str,
    candidates: Candidates<'_>,
) -> Replacement {
    let names = match candidates {
        Candidates::Discovered => match discover(client, profile) {
            Ok(names) => names,
            Err(reason) => return Replacement::Unavailable { reason },
        },
        Candidates::Preferred(list) => list.to_vec(),
    };

    let verify_installed = matches!(candidates, Candidates::Preferred(_));
    let mut tried = Vec::new();

    for name in names.iter().filter(|n| n.as_str() != target) {
        if verify_installed {
            match client.exists(profile, &["theme", "is-installed", name.as_str()]) {
                Ok(true) => {}
                Ok(false) => {
                    log::debug!("fallback theme {name} is not installed");
                    continue;
                }
                Err(e) => {
                    log::warn!("could not check fallback theme {name}: {e}");
                    continue;
                }
            }
        }

        tried.push(name.as_str());
        match client.run(profile, &["theme", "activate", name.as_str()]) {
            Ok(()) => {
                log::info!("activated {name} in place of {target}");
                return Replacement::Activated(name.clone());
            }
            Err(e) => log::warn!("could not activate fallback theme {name}: {e}"),
        }
    }

    let reason = if tried.is_empty() {
        "no other installed theme is available".to_string()
    } else {
        format!("could not activate any of: {}", tried.join(", "))
    };
    Replacement::Unavailable { reason }
}

fn discover(client: &Client, profile: &ConnectionProfile) -> Result<Vec<String>, String> {
    let invocation = client.run_captured(profile, &["theme", "list", "--status=inactive", "--field=name"]);
    if !invocation.success {
        log::warn!("could not list inactive themes: {}", invocation.output.trim());
        return Err(format!("listing inactive themes failed: {}", invocation.output.trim()));
    }

    Ok(invocation
        .output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}
