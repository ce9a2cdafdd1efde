//! Plugin reconciler.
//!
//! wp-cli may activate a plugin on install even without `--activate`
//! (network-activated or must-use setups, some installers), so activation is
//! always read back after every mutation and the read-back value is what
//! gets recorded.

use crate::error::{ReconcileError, Result};
use crate::resource::Reconciler;
use crate::types::{ActivationCheck, Observed, Removal, Warning};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wpcli::{Client, ConnectionProfile, Presence, SettleConfig, settle, status};

/// Delay before re-reading plugin status after a mutation.
pub const PLUGIN_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Desired plugin state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// Plugin slug as known to wordpress.org or a zip/URL wp-cli accepts
    pub slug: String,
    /// Requested activation; `None` leaves activation alone on update and
    /// means inactive on create
    #[serde(default)]
    pub active: Option<bool>,
}

impl PluginSpec {
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

/// Plugin state as verified on the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginState {
    /// Plugin slug
    pub slug: String,
    /// Whether the site reports the plugin active
    pub active: bool,
}

/// Installs, activates, deactivates and deletes plugins.
#[derive(Debug, Clone)]
pub struct PluginReconciler {
    client: Client,
    settle: SettleConfig,
}

impl PluginReconciler {
    /// Create a reconciler with the default settle delay.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            settle: SettleConfig::new(PLUGIN_SETTLE_DELAY),
        }
    }

    /// Override the settle policy.
    pub fn with_settle(mut self, settle: SettleConfig) -> Self {
        self.settle = settle;
        self
    }

    fn installed(&self, profile: &ConnectionProfile, slug: &str) -> Result<Presence> {
        self.client
            .presence(profile, &["plugin", "is-installed", slug])
            .map_err(ReconcileError::tool("Failed to check whether plugin is installed"))
    }

    fn status(&self, profile: &ConnectionProfile, slug: &str) -> Result<ActivationCheck> {
        let invocation = self.client.run_captured(profile, &["plugin", "status", slug]);
        if !invocation.success {
            return Err(ReconcileError::tool("Failed to verify plugin status")(
                invocation.into_error(),
            ));
        }

        let reading = status::plugin_status(&invocation.output, slug);
        log::debug!(
            "plugin {slug}: active={} ({:?})",
            reading.active,
            reading.confidence
        );

        Ok(ActivationCheck {
            active: reading.active,
            output: invocation.output,
        })
    }

    fn set_active(&self, profile: &ConnectionProfile, slug: &str, active: bool) -> Result<ActivationCheck> {
        let verb = if active { "activate" } else { "deactivate" };
        log::info!("{verb} plugin {slug} on {profile}");
        self.client
            .run(profile, &["plugin", verb, slug])
            .map_err(ReconcileError::tool("Failed to update plugin activation"))?;

        settle::converge(
            &self.settle,
            || self.status(profile, slug),
            |check| check.active == active,
        )
    }

    /// Compare the verified activation against the request.
    ///
    /// An unwanted activation that survived an explicit deactivate is fatal.
    /// A requested activation that did not stick is only a warning.
    fn judge(slug: &str, wanted: bool, check: &ActivationCheck) -> Result<Vec<Warning>> {
        match (wanted, check.active) {
            (false, true) => Err(ReconcileError::verification(
                "Plugin is still active after deactivation",
                format!("{slug} reports active after an explicit deactivate"),
                check.output.clone(),
            )),
            (true, false) => {
                log::warn!("plugin {slug} did not activate");
                Ok(vec![Warning::new(
                    "Plugin is not active",
                    format!("{slug} was asked to be active but reports inactive"),
                )])
            }
            _ => Ok(Vec::new()),
        }
    }
}

impl Reconciler for PluginReconciler {
    type Desired = PluginSpec;
    type State = PluginState;

    fn kind(&self) -> &'static str {
        "plugin"
    }

    fn create(&self, profile: &ConnectionProfile, desired: &PluginSpec) -> Result<Observed<PluginState>> {
        let slug = desired.slug.as_str();
        let wanted = desired.active.unwrap_or(false);

        let mut args = vec!["plugin", "install", slug];
        if wanted {
            args.push("--activate");
        }

        log::info!("installing plugin {slug} on {profile} (active: {wanted})");
        let install_output = self
            .client
            .output(profile, &args)
            .map_err(ReconcileError::tool("Failed to install plugin"))?;

        settle::pause(&self.settle);

        // install success alone is not trusted
        let installed = self.installed(profile, slug)?;
        if !installed.present {
            let output = [install_output.trim(), installed.output.trim()]
                .into_iter()
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(ReconcileError::verification(
                "Plugin not installed after install attempt",
                format!("{slug} is not reported as installed"),
                output,
            ));
        }

        let mut check = self.status(profile, slug)?;
        if !wanted && check.active {
            log::info!("plugin {slug} was activated on install, deactivating");
            check = self.set_active(profile, slug, false)?;
        }

        let warnings = Self::judge(slug, wanted, &check)?;
        Ok(Observed::with_warnings(
            PluginState {
                slug: slug.to_string(),
                active: check.active,
            },
            warnings,
        ))
    }

    fn read(&self, profile: &ConnectionProfile, prior: &PluginState) -> Result<Option<Observed<PluginState>>> {
        let slug = prior.slug.as_str();

        if !self.installed(profile, slug)?.present {
            log::info!("plugin {slug} is no longer installed on {profile}");
            return Ok(None);
        }

        let check = self.status(profile, slug)?;
        Ok(Some(Observed::new(PluginState {
            slug: slug.to_string(),
            active: check.active,
        })))
    }

    fn update(
        &self,
        profile: &ConnectionProfile,
        desired: &PluginSpec,
        prior: &PluginState,
    ) -> Result<Observed<PluginState>> {
        let slug = desired.slug.as_str();

        let (check, warnings) = match desired.active {
            Some(wanted) if wanted != prior.active => {
                let check = self.set_active(profile, slug, wanted)?;
                let warnings = Self::judge(slug, wanted, &check)?;
                (check, warnings)
            }
            _ => {
                log::debug!("plugin {slug} activation unchanged, verifying only");
                (self.status(profile, slug)?, Vec::new())
            }
        };

        Ok(Observed::with_warnings(
            PluginState {
                slug: slug.to_string(),
                active: check.active,
            },
            warnings,
        ))
    }

    fn delete(&self, profile: &ConnectionProfile, prior: &PluginState) -> Result<Observed<Removal>> {
        log::info!("deleting plugin {} on {profile}", prior.slug);
        self.client
            .run(profile, &["plugin", "delete", prior.slug.as_str()])
            .map_err(ReconcileError::tool("Failed to delete plugin"))?;

        Ok(Observed::new(Removal::Removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wpcli::runner::{Reply, ScriptedRunner};

    fn reconciler(runner: ScriptedRunner) -> (PluginReconciler, Arc<ScriptedRunner>) {
        let runner = Arc::new(runner);
        let client = Client::with_runner(runner.clone());
        (
            PluginReconciler::new(client).with_settle(SettleConfig::immediate()),
            runner,
        )
    }

    fn profile() -> ConnectionProfile {
        ConnectionProfile::local().with_remote_path("/var/www/html")
    }

    fn state(active: bool) -> PluginState {
        PluginState {
            slug: "akismet".to_string(),
            active,
        }
    }

    #[test]
    fn test_create_deactivates_auto_activated_plugin() {
        let (plugins, runner) = reconciler(
            ScriptedRunner::new()
                .on(&["plugin", "install", "akismet"], Reply::ok("Plugin installed successfully."))
                .on(&["plugin", "is-installed", "akismet"], Reply::ok(""))
                .on(&["plugin", "status", "akismet"], Reply::ok("Status: Active"))
                .on(&["plugin", "status", "akismet"], Reply::ok("Status: Inactive"))
                .on(&["plugin", "deactivate", "akismet"], Reply::ok("Success")),
        );

        let observed = plugins
            .create(&profile(), &PluginSpec::new("akismet").with_active(false))
            .unwrap();

        assert_eq!(observed.state, state(false));
        assert!(observed.warnings.is_empty());
        assert_eq!(runner.calls_matching(&["plugin", "deactivate", "akismet"]), 1);
        assert_eq!(runner.calls_matching(&["plugin", "status", "akismet"]), 2);
        assert!(!runner.was_called_with(&["--activate"]));
    }

    #[test]
    fn test_create_requests_activation() {
        let (plugins, runner) = reconciler(
            ScriptedRunner::new()
                .on(&["plugin", "install", "akismet", "--activate"], Reply::ok(""))
                .on(&["plugin", "is-installed", "akismet"], Reply::ok(""))
                .on(&["plugin", "status", "akismet"], Reply::ok("Status: Active")),
        );

        let observed = plugins
            .create(&profile(), &PluginSpec::new("akismet").with_active(true))
            .unwrap();

        assert!(observed.state.active);
        assert_eq!(
            runner.calls()[0],
            vec!["--path=/var/www/html", "plugin", "install", "akismet", "--activate"]
        );
    }

    #[test]
    fn test_create_reports_verified_activation_not_request() {
        let (plugins, runner) = reconciler(
            ScriptedRunner::new()
                .on(&["plugin", "install", "akismet", "--activate"], Reply::ok(""))
                .on(&["plugin", "is-installed", "akismet"], Reply::ok(""))
                .on(&["plugin", "status", "akismet"], Reply::ok("Status: Inactive")),
        );

        let observed = plugins
            .create(&profile(), &PluginSpec::new("akismet").with_active(true))
            .unwrap();

        assert!(!observed.state.active);
        assert_eq!(observed.warnings.len(), 1);
        assert_eq!(runner.calls_matching(&["plugin", "activate", "akismet"]), 0);
    }

    #[test]
    fn test_create_install_failure() {
        let (plugins, _) = reconciler(
            ScriptedRunner::new().on(&["plugin", "install", "akismet"], Reply::fail("error occurred")),
        );

        let err = plugins
            .create(&profile(), &PluginSpec::new("akismet"))
            .unwrap_err();

        assert_eq!(err.summary(), "Failed to install plugin");
        let msg = err.to_string();
        assert!(msg.contains("plugin install akismet"));
        assert!(msg.contains("error occurred"));
    }

    #[test]
    fn test_create_not_installed_after_success() {
        let (plugins, runner) = reconciler(
            ScriptedRunner::new()
                .on(&["plugin", "install", "akismet"], Reply::ok("Plugin installed successfully."))
                .on(&["plugin", "is-installed", "akismet"], Reply::fail("")),
        );

        let err = plugins
            .create(&profile(), &PluginSpec::new("akismet"))
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Verification { .. }));
        assert_eq!(runner.calls_matching(&["plugin", "status", "akismet"]), 0);
    }

    #[test]
    fn test_create_not_installed_keeps_tool_output() {
        let (plugins, _) = reconciler(
            ScriptedRunner::new()
                .on(
                    &["plugin", "install", "akismet"],
                    Reply::ok("Warning: download served from cache\nPlugin installed successfully."),
                )
                .on(
                    &["plugin", "is-installed", "akismet"],
                    Reply::fail("Warning: akismet: plugin directory missing"),
                ),
        );

        let err = plugins
            .create(&profile(), &PluginSpec::new("akismet"))
            .unwrap_err();

        assert_eq!(err.summary(), "Plugin not installed after install attempt");
        assert!(err.output().contains("download served from cache"));
        assert!(err.output().contains("plugin directory missing"));
        assert!(err.to_string().contains("plugin directory missing"));
    }

    #[test]
    fn test_create_deactivation_does_not_stick() {
        let (plugins, _) = reconciler(
            ScriptedRunner::new()
                .on(&["plugin", "install", "akismet"], Reply::ok(""))
                .on(&["plugin", "is-installed", "akismet"], Reply::ok(""))
                .on(&["plugin", "status", "akismet"], Reply::ok("Status: Active"))
                .on(&["plugin", "deactivate", "akismet"], Reply::ok("")),
        );

        let err = plugins
            .create(&profile(), &PluginSpec::new("akismet").with_active(false))
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Verification { .. }));
        assert_eq!(err.output(), "Status: Active");
    }

    #[test]
    fn test_create_status_failure() {
        let (plugins, _) = reconciler(
            ScriptedRunner::new()
                .on(&["plugin", "install", "akismet"], Reply::ok(""))
                .on(&["plugin", "is-installed", "akismet"], Reply::ok(""))
                .on(&["plugin", "status", "akismet"], Reply::fail("Error: boom")),
        );

        let err = plugins
            .create(&profile(), &PluginSpec::new("akismet"))
            .unwrap_err();

        assert_eq!(err.summary(), "Failed to verify plugin status");
        assert_eq!(err.output(), "Error: boom");
    }

    #[test]
    fn test_read_not_installed() {
        let (plugins, runner) = reconciler(
            ScriptedRunner::new().on(&["plugin", "is-installed", "akismet"], Reply::fail("")),
        );

        assert!(plugins.read(&profile(), &state(true)).unwrap().is_none());
        assert_eq!(runner.calls_matching(&["plugin", "status", "akismet"]), 0);
    }

    #[test]
    fn test_read_unreachable_is_error() {
        let (plugins, _) = reconciler(ScriptedRunner::new().on(
            &["plugin", "is-installed", "akismet"],
            Reply::exit(255, "ssh: Could not resolve hostname web1"),
        ));

        assert!(plugins.read(&profile(), &state(true)).is_err());
    }

    #[test]
    fn test_read_after_create_matches_verified_state() {
        let (plugins, _) = reconciler(
            ScriptedRunner::new()
                .on(&["plugin", "install", "akismet", "--activate"], Reply::ok(""))
                .on(&["plugin", "is-installed", "akismet"], Reply::ok(""))
                .on(&["plugin", "status", "akismet"], Reply::ok("akismet [active]")),
        );

        let created = plugins
            .create(&profile(), &PluginSpec::new("akismet").with_active(true))
            .unwrap();
        let read = plugins.read(&profile(), &created.state).unwrap().unwrap();

        assert_eq!(read.state, created.state);
    }

    #[test]
    fn test_update_no_change_only_verifies() {
        let (plugins, runner) = reconciler(
            ScriptedRunner::new().on(&["plugin", "status", "akismet"], Reply::ok("Status: Active")),
        );

        let observed = plugins
            .update(&profile(), &PluginSpec::new("akismet").with_active(true), &state(true))
            .unwrap();

        assert!(observed.state.active);
        assert_eq!(runner.calls().len(), 1);
        assert!(!runner.was_called_with(&["plugin", "activate"]));
        assert!(!runner.was_called_with(&["plugin", "deactivate"]));
    }

    #[test]
    fn test_update_without_preference_leaves_activation() {
        let (plugins, runner) = reconciler(
            ScriptedRunner::new().on(&["plugin", "status", "akismet"], Reply::ok("Status: Inactive")),
        );

        let observed = plugins
            .update(&profile(), &PluginSpec::new("akismet"), &state(true))
            .unwrap();

        // drift is reported, not corrected
        assert!(!observed.state.active);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_update_activates() {
        let (plugins, runner) = reconciler(
            ScriptedRunner::new()
                .on(&["plugin", "activate", "akismet"], Reply::ok("Success"))
                .on(&["plugin", "status", "akismet"], Reply::ok("Status: Active")),
        );

        let observed = plugins
            .update(&profile(), &PluginSpec::new("akismet").with_active(true), &state(false))
            .unwrap();

        assert!(observed.state.active);
        assert_eq!(runner.calls_matching(&["plugin", "activate", "akismet"]), 1);
    }

    #[test]
    fn test_update_activation_failure() {
        let (plugins, _) = reconciler(
            ScriptedRunner::new().on(&["plugin", "deactivate", "akismet"], Reply::fail("Error: nope")),
        );

        let err = plugins
            .update(&profile(), &PluginSpec::new("akismet").with_active(false), &state(true))
            .unwrap_err();

        assert!(err.to_string().contains("plugin deactivate akismet"));
        assert!(err.to_string().contains("Error: nope"));
    }

    #[test]
    fn test_delete() {
        let (plugins, runner) = reconciler(
            ScriptedRunner::new().on(&["plugin", "delete", "akismet"], Reply::ok("Deleted")),
        );

        let observed = plugins.delete(&profile(), &state(false)).unwrap();

        assert_eq!(observed.state, Removal::Removed);
        assert_eq!(runner.calls_matching(&["plugin", "delete", "akismet"]), 1);
    }

    #[test]
    fn test_delete_failure() {
        let (plugins, _) = reconciler(
            ScriptedRunner::new().on(&["plugin", "delete", "akismet"], Reply::fail("Error: locked")),
        );

        let err = plugins.delete(&profile(), &state(false)).unwrap_err();
        assert!(err.to_string().contains("plugin delete akismet"));
        assert!(err.to_string().contains("Error: locked"));
    }
}
