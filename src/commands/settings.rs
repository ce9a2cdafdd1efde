use anyhow::{Result, bail};
use reconcile::{Reconciler, SiteSettings, SiteSettingsReconciler};

use crate::Context;
use crate::cli::{SettingsArgs, SettingsCommand};
use crate::state::SiteState;
use crate::ui;

const KIND: &str = "site settings";

pub fn run(ctx: &Context, cmd: SettingsCommand) -> Result<()> {
    let reconciler = SiteSettingsReconciler::new(ctx.client());

    match cmd {
        SettingsCommand::Apply(args) => apply(ctx, &reconciler, args),
        SettingsCommand::Read => read(ctx, &reconciler),
        SettingsCommand::Remove => remove(ctx, &reconciler),
    }
}

/// Flags given on the command line replace the tracked values; the rest
/// stay managed as they were.
fn merge(tracked: Option<SiteSettings>, args: SettingsArgs) -> SiteSettings {
    let mut merged = tracked.unwrap_or_default();
    let SettingsArgs {
        site_name,
        site_description,
        admin_email,
        timezone,
        date_format,
        time_format,
        start_of_week,
    } = args;

    merged.site_name = site_name.or(merged.site_name);
    merged.site_description = site_description.or(merged.site_description);
    merged.admin_email = admin_email.or(merged.admin_email);
    merged.timezone = timezone.or(merged.timezone);
    merged.date_format = date_format.or(merged.date_format);
    merged.time_format = time_format.or(merged.time_format);
    merged.start_of_week = start_of_week.or(merged.start_of_week);
    merged
}

fn print(settings: &SiteSettings) {
    for (option, value) in settings.managed() {
        ui::kv(option, value);
    }
}

fn apply(ctx: &Context, reconciler: &SiteSettingsReconciler, args: SettingsArgs) -> Result<()> {
    let mut state = SiteState::load_from(&ctx.state_path)?;
    let prior = state.site(&ctx.profile).and_then(|site| site.site_settings.clone());

    let desired = merge(prior.clone(), args);
    if desired.is_empty() {
        bail!("No settings given; pass at least one of --site-name, --admin-email, ...");
    }

    ui::header("Applying site settings");
    let result = reconciler.apply(&ctx.profile, &desired, prior.as_ref());
    let observed = super::report(ctx, KIND, result)?;

    print(&observed.state);
    state.site_mut(&ctx.profile).site_settings = Some(observed.state);
    state.touch(&ctx.state_path)?;

    ui::success("Site settings applied");
    Ok(())
}

fn read(ctx: &Context, reconciler: &SiteSettingsReconciler) -> Result<()> {
    let mut state = SiteState::load_from(&ctx.state_path)?;
    let Some(prior) = state.site(&ctx.profile).and_then(|site| site.site_settings.clone()) else {
        bail!("No site settings are tracked for {}", ctx.profile);
    };

    let found = reconciler
        .read(&ctx.profile, &prior)
        .map_err(|err| super::explain(ctx, err))?;

    let site = state.site_mut(&ctx.profile);
    match found {
        Some(observed) => {
            print(&observed.state);
            if observed.state != prior {
                ui::warn("Settings changed on the site since they were last applied");
            }
            site.site_settings = Some(observed.state);
        }
        None => site.site_settings = None,
    }

    state.prune();
    state.touch(&ctx.state_path)
}

fn remove(ctx: &Context, reconciler: &SiteSettingsReconciler) -> Result<()> {
    let mut state = SiteState::load_from(&ctx.state_path)?;
    let Some(prior) = state.site(&ctx.profile).and_then(|site| site.site_settings.clone()) else {
        bail!("No site settings are tracked for {}", ctx.profile);
    };

    let result = reconciler.delete(&ctx.profile, &prior);
    let observed = super::report(ctx, KIND, result)?;

    state.site_mut(&ctx.profile).site_settings = None;
    state.prune();
    state.touch(&ctx.state_path)?;

    if observed.state.is_removed() {
        ui::success("Site settings removed");
    } else {
        ui::success("Stopped tracking site settings; values stay on the site");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_tracked_fields() {
        let tracked = SiteSettings {
            site_name: Some("Old".to_string()),
            timezone: Some("UTC".to_string()),
            ..SiteSettings::default()
        };
        let args = SettingsArgs {
            site_name: Some("New".to_string()),
            start_of_week: Some("1".to_string()),
            ..SettingsArgs::default()
        };

        let merged = merge(Some(tracked), args);

        assert_eq!(merged.site_name.as_deref(), Some("New"));
        assert_eq!(merged.timezone.as_deref(), Some("UTC"));
        assert_eq!(merged.start_of_week.as_deref(), Some("1"));
        assert!(merged.admin_email.is_none());
    }

    #[test]
    fn test_merge_without_anything_is_empty() {
        assert!(merge(None, SettingsArgs::default()).is_empty());
    }
}
