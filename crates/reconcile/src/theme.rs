//! Theme reconciler.
//!
//! Exactly one theme is active on a WordPress site at all times, and the
//! site enforces that on its own. Activation is direct; deactivation can
//! only happen by activating a replacement (see [`fallback`](crate::fallback)).
//! When no replacement exists the theme stays active and the operation
//! succeeds with a warning.

use crate::error::{ReconcileError, Result};
use crate::fallback::{self, Candidates, DEFAULT_FALLBACK_THEMES, Replacement};
use crate::resource::Reconciler;
use crate::types::{ActivationCheck, Observed, Removal, Warning};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wpcli::{Client, ConnectionProfile, SettleConfig, settle, status};

/// Delay before re-reading theme status after a mutation.
pub const THEME_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Desired theme state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSpec {
    /// Theme slug
    pub slug: String,
    /// Requested activation; `None` leaves activation alone on update and
    /// means inactive on create
    #[serde(default)]
    pub active: Option<bool>,
}

impl ThemeSpec {
    /// Desired state with no activation preference.
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            active: None,
        }
    }

    /// Request an activation state.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

/// Theme state as verified on the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeState {
    /// Theme slug
    pub slug: String,
    /// Whether the site reports the theme active
    pub active: bool,
}

/// Installs, switches and deletes themes without breaking the
/// one-active-theme rule.
#[derive(Debug, Clone)]
pub struct ThemeReconciler {
    client: Client,
    settle: SettleConfig,
    fallbacks: Vec<String>,
}

impl ThemeReconciler {
    /// Create a reconciler with the default settle delay and fallback list.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            settle: SettleConfig::new(THEME_SETTLE_DELAY),
            fallbacks: DEFAULT_FALLBACK_THEMES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Override the settle policy.
    pub fn with_settle(mut self, settle: SettleConfig) -> Self {
        self.settle = settle;
        self
    }

    /// Themes to try, in order, when deleting the active theme.
    pub fn with_fallbacks(mut self, fallbacks: Vec<String>) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    fn is_installed(&self, profile: &ConnectionProfile, slug: &str) -> Result<bool> {
        self.client
            .exists(profile, &["theme", "is-installed", slug])
            .map_err(ReconcileError::tool("Failed to check whether theme is installed"))
    }

    fn status(&self, profile: &ConnectionProfile, slug: &str, summary: &str) -> Result<ActivationCheck> {
        let invocation = self.client.run_captured(profile, &["theme", "status", slug]);
        if !invocation.success {
            return Err(ReconcileError::tool(summary)(invocation.into_error()));
        }

        let active = status::is_theme_active(&invocation.output);
        log::debug!("theme {slug}: active={active}");
        Ok(ActivationCheck {
            active,
            output: invocation.output,
        })
    }

    fn verify(&self, profile: &ConnectionProfile, slug: &str, wanted: bool) -> Result<ActivationCheck> {
        settle::converge(
            &self.settle,
            || self.status(profile, slug, "Failed to verify theme status"),
            |check| check.active == wanted,
        )
    }

    fn activate(&self, profile: &ConnectionProfile, slug: &str) -> Result<ActivationCheck> {
        log::info!("activating theme {slug} on {profile}");
        self.client
            .run(profile, &["theme", "activate", slug])
            .map_err(ReconcileError::tool("Failed to activate theme"))?;
        self.verify(profile, slug, true)
    }

    /// Move `slug` out of the active slot by activating a discovered
    /// replacement. Falls back to the current state plus a warning.
    fn deactivate(
        &self,
        profile: &ConnectionProfile,
        slug: &str,
        current: ActivationCheck,
    ) -> Result<(ActivationCheck, Vec<Warning>)> {
        match fallback::activate_replacement(&self.client, profile, slug, Candidates::Discovered) {
            Replacement::Activated(_) => {
                let check = self.verify(profile, slug, false)?;
                let warnings = if check.active {
                    vec![Warning::new(
                        "Theme is still active",
                        format!("another theme was activated but {slug} still reports active"),
                    )]
                } else {
                    Vec::new()
                };
                Ok((check, warnings))
            }
            Replacement::Unavailable { reason } => {
                log::warn!("theme {slug} cannot be deactivated: {reason}");
                Ok((
                    current,
                    vec![Warning::new(
                        "Theme could not be deactivated",
                        format!("WordPress requires one active theme and {reason}. {slug} will remain active."),
                    )],
                ))
            }
        }
    }
}

impl Reconciler for ThemeReconciler {
    type Desired = ThemeSpec;
    type State = ThemeState;

    fn kind(&self) -> &'static str {
        "theme"
    }

    fn create(&self, profile: &ConnectionProfile, desired: &ThemeSpec) -> Result<Observed<ThemeState>> {
        let slug = desired.slug.as_str();
        let wanted = desired.active.unwrap_or(false);

        log::info!("installing theme {slug} on {profile} (active: {wanted})");
        self.client
            .run(profile, &["theme", "install", slug])
            .map_err(ReconcileError::tool("Failed to install theme"))?;

        settle::pause(&self.settle);

        let current = self.status(profile, slug, "Failed to determine theme status")?;
        let (check, warnings) = match (wanted, current.active) {
            (true, false) => (self.activate(profile, slug)?, Vec::new()),
            (false, true) => self.deactivate(profile, slug, current)?,
            _ => (current, Vec::new()),
        };

        Ok(Observed::with_warnings(
            ThemeState {
                slug: slug.to_string(),
                active: check.active,
            },
            warnings,
        ))
    }

    fn read(&self, profile: &ConnectionProfile, prior: &ThemeState) -> Result<Option<Observed<ThemeState>>> {
        let slug = prior.slug.as_str();

        if !self.is_installed(profile, slug)? {
            log::info!("theme {slug} is no longer installed on {profile}");
            return Ok(None);
        }

        let check = self.status(profile, slug, "Failed to check theme status")?;
        Ok(Some(Observed::new(ThemeState {
            slug: slug.to_string(),
            active: check.active,
        })))
    }

    fn update(
        &self,
        profile: &ConnectionProfile,
        desired: &ThemeSpec,
        prior: &ThemeState,
    ) -> Result<Observed<ThemeState>> {
        let slug = desired.slug.as_str();

        let (check, warnings) = match desired.active {
            Some(true) if !prior.active => (self.activate(profile, slug)?, Vec::new()),
            Some(false) if prior.active => {
                let current = ActivationCheck {
                    active: true,
                    output: String::new(),
                };
                let (check, warnings) = self.deactivate(profile, slug, current)?;
                if warnings.is_empty() {
                    (check, warnings)
                } else {
                    // nothing changed, but record what the site shows now
                    (self.status(profile, slug, "Failed to verify theme status")?, warnings)
                }
            }
            _ => {
                log::debug!("theme {slug} activation unchanged, verifying only");
                (self.status(profile, slug, "Failed to verify theme status")?, Vec::new())
            }
        };

        Ok(Observed::with_warnings(
            ThemeState {
                slug: slug.to_string(),
                active: check.active,
            },
            warnings,
        ))
    }

    fn delete(&self, profile: &ConnectionProfile, prior: &ThemeState) -> Result<Observed<Removal>> {
        let slug = prior.slug.as_str();

        let active = match self.status(profile, slug, "Failed to check theme status") {
            Ok(check) => check.active,
            Err(e) => {
                log::warn!("could not tell whether theme {slug} is active, deleting anyway: {e}");
                false
            }
        };

        if active {
            match fallback::activate_replacement(
                &self.client,
                profile,
                slug,
                Candidates::Preferred(&self.fallbacks),
            ) {
                Replacement::Activated(_) => settle::pause(&self.settle),
                Replacement::Unavailable { reason } => {
                    log::warn!("leaving active theme {slug} in place: {reason}");
                    return Ok(Observed::warn(
                        Removal::LeftInPlace,
                        Warning::new(
                            "Cannot delete active theme",
                            format!(
                                "{slug} is active and no fallback could be activated ({reason}). \
                                 It is no longer tracked but still exists in WordPress."
                            ),
                        ),
                    ));
                }
            }
        }

        log::info!("deleting theme {slug} on {profile}");
        self.client
            .run(profile, &["theme", "delete", slug])
            .map_err(ReconcileError::tool("Failed to delete theme"))?;

        Ok(Observed::new(Removal::Removed))
    }
}
