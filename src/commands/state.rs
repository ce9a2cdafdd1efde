use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::state::{SiteState, TrackedSite};
use crate::ui;

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let state = SiteState::load_from(&ctx.state_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    ui::header("Tracked State");
    ui::kv("File", &ctx.state_path.display().to_string());
    ui::kv("Last updated", &state.last_updated.format("%Y-%m-%d %H:%M:%S UTC").to_string());

    if state.sites.is_empty() {
        ui::info("Nothing tracked yet");
        return Ok(());
    }

    for (label, site) in &state.sites {
        let marker = if *label == ctx.profile.label() { " (current)" } else { "" };
        ui::section(&format!("{label}{marker}"));
        print_site(site, ctx.verbose > 0);
    }
    Ok(())
}

fn activation(active: bool) -> String {
    if active {
        "active".green().to_string()
    } else {
        "inactive".dimmed().to_string()
    }
}

fn print_site(site: &TrackedSite, detailed: bool) {
    for (slug, plugin) in &site.plugins {
        ui::kv(&format!("plugin {slug}"), &activation(plugin.active));
    }
    for (slug, theme) in &site.themes {
        ui::kv(&format!("theme {slug}"), &activation(theme.active));
    }
    for (name, value) in &site.options {
        ui::kv(&format!("option {name}"), value);
    }
    for (username, user) in &site.users {
        ui::kv(&format!("user {username}"), &format!("{} <{}>", user.role, user.email));
    }
    if let Some(settings) = &site.site_settings {
        if detailed {
            for (option, value) in settings.managed() {
                ui::kv(&format!("setting {option}"), value);
            }
        } else {
            ui::kv("settings", &format!("{} managed", settings.managed().count()));
        }
    }
    ui::dim(&format!("{} records", site.len()));
}
