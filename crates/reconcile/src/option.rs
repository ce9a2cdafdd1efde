//! Single `wp_options` entry.

use crate::error::{ReconcileError, Result};
use crate::resource::Reconciler;
use crate::types::{Observed, Removal, Warning};
use serde::{Deserialize, Serialize};
use wpcli::{Client, ConnectionProfile, ErrorCategory};

/// A named option and its string value.
///
/// Used both as the desired record and as the observed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WpOption {
    /// Option name (`blogname`, `posts_per_page`, ...)
    pub name: String,
    /// Option value as wp-cli prints it
    pub value: String,
}

impl WpOption {
    /// Create an option record.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Sets, reads and deletes options.
#[derive(Debug, Clone)]
pub struct OptionReconciler {
    client: Client,
}

impl OptionReconciler {
    /// Create a reconciler.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Read an option value, `None` when it does not exist.
    ///
    /// Only transport and permission failures are errors: `option get` exits
    /// 1 for a missing option and there is nothing else to tell it apart by.
    pub fn get(&self, profile: &ConnectionProfile, name: &str) -> Result<Option<String>> {
        let invocation = self.client.run_captured(profile, &["option", "get", name]);
        if invocation.success {
            return Ok(Some(invocation.output.trim().to_string()));
        }

        match ErrorCategory::from_output(&invocation.output, invocation.exit_code) {
            ErrorCategory::Connection | ErrorCategory::Permission => {
                Err(ReconcileError::tool("Failed to read option")(invocation.into_error()))
            }
            _ => {
                log::debug!("option {name} not readable, treating as absent");
                Ok(None)
            }
        }
    }

    fn set(&self, profile: &ConnectionProfile, desired: &WpOption, summary: &str) -> Result<Observed<WpOption>> {
        let name = desired.name.as_str();

        log::info!("setting option {name} on {profile}");
        self.client
            .run(profile, &["option", "set", name, desired.value.as_str()])
            .map_err(ReconcileError::tool(summary))?;

        let value = self
            .client
            .output(profile, &["option", "get", name])
            .map_err(|e| {
                ReconcileError::verification(
                    "Option could not be read back",
                    format!("{name} was set but `option get` failed"),
                    e.output(),
                )
            })?
            .trim()
            .to_string();

        let mut warnings = Vec::new();
        if value != desired.value.trim() {
            log::warn!("option {name} reads back as '{value}'");
            warnings.push(Warning::new(
                "Option value differs after set",
                format!("{name} was set to '{}' but reads back as '{value}'", desired.value),
            ));
        }

        Ok(Observed::with_warnings(WpOption::new(name, value), warnings))
    }
}

impl Reconciler for OptionReconciler {
    type Desired = WpOption;
    type State = WpOption;

    fn kind(&self) -> &'static str {
        "option"
    }

    fn create(&self, profile: &ConnectionProfile, desired: &WpOption) -> Result<Observed<WpOption>> {
        self.set(profile, desired, "Failed to set option")
    }

    fn read(&self, profile: &ConnectionProfile, prior: &WpOption) -> Result<Option<Observed<WpOption>>> {
        Ok(self
            .get(profile, &prior.name)?
            .map(|value| Observed::new(WpOption::new(prior.name.as_str(), value))))
    }

    fn update(&self, profile: &ConnectionProfile, desired: &WpOption, _prior: &WpOption) -> Result<Observed<WpOption>> {
        self.set(profile, desired, "Failed to update option")
    }

    fn delete(&self, profile: &ConnectionProfile, prior: &WpOption) -> Result<Observed<Removal>> {
        log::info!("deleting option {} on {profile}", prior.name);
        self.client
            .run(profile, &["option", "delete", prior.name.as_str()])
            .map_err(ReconcileError::tool("Failed to delete option"))?;

        Ok(Observed::new(Removal::Removed))
    }
}
