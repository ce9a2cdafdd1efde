use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reconcile::{PluginState, SiteSettings, ThemeState, UserState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use wpcli::ConnectionProfile;

// ============================================================================
// State Structures
// ============================================================================

/// Last observed record of everything wpsite manages, keyed by site.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SiteState {
    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,

    /// Tracked objects per site, keyed by the connection profile label
    #[serde(default)]
    pub sites: BTreeMap<String, TrackedSite>,
}

/// Observed state of the objects managed on one site
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TrackedSite {
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginState>,

    #[serde(default)]
    pub themes: BTreeMap<String, ThemeState>,

    /// Option name to last read-back value
    #[serde(default)]
    pub options: BTreeMap<String, String>,

    #[serde(default)]
    pub users: BTreeMap<String, UserState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_settings: Option<SiteSettings>,
}

impl TrackedSite {
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
            && self.themes.is_empty()
            && self.options.is_empty()
            && self.users.is_empty()
            && self.site_settings.is_none()
    }

    /// Number of tracked records
    pub fn len(&self) -> usize {
        self.plugins.len()
            + self.themes.len()
            + self.options.len()
            + self.users.len()
            + usize::from(self.site_settings.is_some())
    }
}

// ============================================================================
// SiteState Implementation
// ============================================================================

impl SiteState {
    /// Load state from `path`, or return default if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to `path`, creating the parent directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        self.save_to(path)
    }

    /// Tracked objects for a site, if any
    pub fn site(&self, profile: &ConnectionProfile) -> Option<&TrackedSite> {
        self.sites.get(&profile.label())
    }

    /// Get or create the tracked objects for a site
    pub fn site_mut(&mut self, profile: &ConnectionProfile) -> &mut TrackedSite {
        self.sites.entry(profile.label()).or_default()
    }

    /// Drop sites that no longer track anything
    pub fn prune(&mut self) {
        self.sites.retain(|_, site| !site.is_empty());
    }
}

impl Default for SiteState {
    fn default() -> Self {
        Self {
            last_updated: Utc::now(),
            sites: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
