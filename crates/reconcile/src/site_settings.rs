//! General site settings as one aggregate.
//!
//! Each field maps to a WordPress option. Only fields that are set are
//! written or tracked; unset fields are left alone on the site. Settings
//! cannot be "deleted": delete leaves everything as it is.

use crate::error::{ReconcileError, Result};
use crate::option::OptionReconciler;
use crate::resource::Reconciler;
use crate::types::{Observed, Removal};
use serde::{Deserialize, Serialize};
use wpcli::{Client, ConnectionProfile};

/// General settings. `None` means "not managed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    /// `blogname`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// `blogdescription`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_description: Option<String>,
    /// `admin_email`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
    /// `timezone_string`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// `date_format`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    /// `time_format`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    /// `start_of_week` (0 = Sunday)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_of_week: Option<String>,
}

impl SiteSettings {
    /// Option name for each field, in write order.
    pub const OPTION_NAMES: [&'static str; 7] = [
        "blogname",
        "blogdescription",
        "admin_email",
        "timezone_string",
        "date_format",
        "time_format",
        "start_of_week",
    ];

    fn fields(&self) -> [&Option<String>; 7] {
        [
            &self.site_name,
            &self.site_description,
            &self.admin_email,
            &self.timezone,
            &self.date_format,
            &self.time_format,
            &self.start_of_week,
        ]
    }

    fn fields_mut(&mut self) -> [&mut Option<String>; 7] {
        [
            &mut self.site_name,
            &mut self.site_description,
            &mut self.admin_email,
            &mut self.timezone,
            &mut self.date_format,
            &mut self.time_format,
            &mut self.start_of_week,
        ]
    }

    /// `(option name, value)` for every managed field.
    pub fn managed(&self) -> impl Iterator<Item = (&'static str, &str)> {
        Self::OPTION_NAMES
            .into_iter()
            .zip(self.fields())
            .filter_map(|(option, value)| value.as_deref().map(|v| (option, v)))
    }

    /// Whether no field is managed.
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|f| f.is_none())
    }
}

/// Writes and re-reads general settings.
#[derive(Debug, Clone)]
pub struct SiteSettingsReconciler {
    client: Client,
    options: OptionReconciler,
}

impl SiteSettingsReconciler {
    /// Create a reconciler.
    pub fn new(client: Client) -> Self {
        Self {
            options: OptionReconciler::new(client.clone()),
            client,
        }
    }

    fn write(&self, profile: &ConnectionProfile, desired: &SiteSettings, summary: &str) -> Result<()> {
        for (option, value) in desired.managed() {
            log::info!("setting {option} on {profile}");
            self.client
                .run(profile, &["option", "set", option, value])
                .map_err(|source| ReconcileError::Tool {
                    summary: format!("{summary}: setting {option} failed"),
                    source,
                })?;
        }
        Ok(())
    }

    /// Refresh every managed field from the site.
    ///
    /// A field that cannot be read keeps its previous value.
    fn refresh(&self, profile: &ConnectionProfile, settings: &SiteSettings) -> SiteSettings {
        let mut refreshed = settings.clone();
        for (option, field) in SiteSettings::OPTION_NAMES.into_iter().zip(refreshed.fields_mut()) {
            if field.is_none() {
                continue;
            }
            match self.options.get(profile, option) {
                Ok(Some(value)) => *field = Some(value),
                Ok(None) => log::debug!("{option} not readable, keeping tracked value"),
                Err(e) => log::warn!("could not read {option}, keeping tracked value: {e}"),
            }
        }
        refreshed
    }
}

impl Reconciler for SiteSettingsReconciler {
    type Desired = SiteSettings;
    type State = SiteSettings;

    fn kind(&self) -> &'static str {
        "site_settings"
    }

    fn create(&self, profile: &ConnectionProfile, desired: &SiteSettings) -> Result<Observed<SiteSettings>> {
        self.write(profile, desired, "Failed to apply site settings")?;
        Ok(Observed::new(self.refresh(profile, desired)))
    }

    /// Never reports the settings as gone.
    fn read(&self, profile: &ConnectionProfile, prior: &SiteSettings) -> Result<Option<Observed<SiteSettings>>> {
        Ok(Some(Observed::new(self.refresh(profile, prior))))
    }

    fn update(
        &self,
        profile: &ConnectionProfile,
        desired: &SiteSettings,
        _prior: &SiteSettings,
    ) -> Result<Observed<SiteSettings>> {
        self.write(profile, desired, "Failed to update site settings")?;
        Ok(Observed::new(self.refresh(profile, desired)))
    }

    fn delete(&self, _profile: &ConnectionProfile, _prior: &SiteSettings) -> Result<Observed<Removal>> {
        log::debug!("site settings stay in place on delete");
        Ok(Observed::new(Removal::LeftInPlace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wpcli::runner::{Reply, ScriptedRunner};

    fn reconciler(runner: ScriptedRunner) -> (SiteSettingsReconciler, Arc<ScriptedRunner>) {
        let runner = Arc::new(runner);
        (SiteSettingsReconciler::new(Client::with_runner(runner.clone())), runner)
    }

    fn partial() -> SiteSettings {
        SiteSettings {
            site_name: Some("My Site".to_string()),
            timezone: Some("Europe/Lisbon".to_string()),
            ..SiteSettings::default()
        }
    }

    #[test]
    fn test_managed_maps_option_names() {
        let settings = partial();
        let managed: Vec<_> = settings.managed().collect();
        assert_eq!(
            managed,
            vec![("blogname", "My Site"), ("timezone_string", "Europe/Lisbon")]
        );
        assert!(SiteSettings::default().is_empty());
    }

    #[test]
    fn test_create_writes_only_present_fields() {
        let (settings, runner) = reconciler(
            ScriptedRunner::new()
                .on(&["option", "set", "blogname", "My Site"], Reply::ok("Success"))
                .on(&["option", "set", "timezone_string", "Europe/Lisbon"], Reply::ok("Success"))
                .on(&["option", "get", "blogname"], Reply::ok("My Site\n"))
                .on(&["option", "get", "timezone_string"], Reply::ok("Europe/Lisbon\n")),
        );

        let observed = settings.create(&ConnectionProfile::local(), &partial()).unwrap();

        assert_eq!(observed.state, partial());
        assert_eq!(runner.calls().len(), 4);
        assert!(!runner.was_called_with(&["admin_email"]));
        assert!(!runner.was_called_with(&["blogdescription"]));
    }

    #[test]
    fn test_write_failure_names_option() {
        let (settings, runner) = reconciler(
            ScriptedRunner::new()
                .on(&["option", "set", "blogname", "My Site"], Reply::ok("Success"))
                .on(&["option", "set", "timezone_string", "Europe/Lisbon"], Reply::fail("Error: invalid timezone")),
        );

        let err = settings.update(&ConnectionProfile::local(), &partial(), &partial()).unwrap_err();

        assert!(err.summary().contains("timezone_string"));
        assert!(err.to_string().contains("invalid timezone"));
        assert!(!runner.was_called_with(&["option", "get"]));
    }

    #[test]
    fn test_read_refreshes_tracked_fields_only() {
        let (settings, runner) = reconciler(
            ScriptedRunner::new()
                .on(&["option", "get", "blogname"], Reply::ok("Renamed\n"))
                .on(&["option", "get", "timezone_string"], Reply::fail("")),
        );

        let observed = settings
            .read(&ConnectionProfile::local(), &partial())
            .unwrap()
            .unwrap();

        assert_eq!(observed.state.site_name.as_deref(), Some("Renamed"));
        // unreadable field keeps its tracked value
        assert_eq!(observed.state.timezone.as_deref(), Some("Europe/Lisbon"));
        assert_eq!(observed.state.admin_email, None);
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn test_delete_is_noop() {
        let (settings, runner) = reconciler(ScriptedRunner::new());

        let observed = settings.delete(&ConnectionProfile::local(), &partial()).unwrap();

        assert_eq!(observed.state, Removal::LeftInPlace);
        assert!(runner.calls().is_empty());
    }
}
