//! Interpreters for wp-cli `status` output.
//!
//! `wp plugin status` and `wp theme status` print free text meant for
//! humans, and the layout has drifted between wp-cli versions. These
//! functions never fail: whatever the text looks like, they resolve to a
//! definite answer, falling back to "not active".

/// How an activation answer was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// An explicit `Status:` line was found
    StatusLine,
    /// Inferred from a line mentioning the plugin
    Inferred,
    /// Nothing recognisable; defaulted to inactive
    Default,
}

/// Activation as read from tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReading {
    /// Whether the plugin or theme is active
    pub active: bool,
    /// Which heuristic produced the answer
    pub confidence: Confidence,
}

impl StatusReading {
    fn new(active: bool, confidence: Confidence) -> Self {
        Self { active, confidence }
    }
}

// "inactive" contains "active", so these only count on lines without it
const ACTIVE_MARKERS: [&str; 5] = [" active", "(active)", "[active]", "active,", "active."];

/// Interpret `wp plugin status <slug>` output.
///
/// 1. A `status: <value>` line decides on its own: active iff the value is
///    exactly `active`.
/// 2. Otherwise, lines mentioning "plugin" or the slug are scanned:
///    `inactive` anywhere means inactive, one of the active markers means
///    active.
/// 3. Otherwise the plugin is reported inactive.
pub fn plugin_status(output: &str, slug: &str) -> StatusReading {
    for line in output.lines() {
        let line = line.trim().to_lowercase();
        if let Some(value) = line.strip_prefix("status:") {
            let value = value.trim();
            log::debug!("plugin status line found, value '{value}'");
            return StatusReading::new(value == "active", Confidence::StatusLine);
        }
    }

    let slug = slug.trim().to_lowercase();
    for line in output.lines() {
        let line = line.trim().to_lowercase();
        let mentions_plugin = line.contains("plugin") || (!slug.is_empty() && line.contains(&slug));
        if !mentions_plugin {
            continue;
        }

        if line.contains("inactive") {
            return StatusReading::new(false, Confidence::Inferred);
        }
        if ACTIVE_MARKERS.iter().any(|m| line.contains(m)) {
            return StatusReading::new(true, Confidence::Inferred);
        }
    }

    log::debug!("could not determine plugin status from output, assuming inactive");
    StatusReading::new(false, Confidence::Default)
}

/// Whether `wp plugin status <slug>` output says the plugin is active.
pub fn is_plugin_active(output: &str, slug: &str) -> bool {
    plugin_status(output, slug).active
}

/// Whether `wp theme status <slug>` output says the theme is active.
///
/// Only `status:` lines are considered; the first one that reports the
/// theme active wins. No such line means not active.
///
/// Unlike a bare substring test for "active", a value containing
/// "inactive" is rejected, so `Status: Inactive` reads as not active.
pub fn is_theme_active(output: &str) -> bool {
    output.lines().any(|line| {
        let line = line.trim().to_lowercase();
        line.strip_prefix("status:")
            .is_some_and(|value| value.contains("active") && !value.contains("inactive"))
    })
}
