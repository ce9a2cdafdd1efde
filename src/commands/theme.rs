use anyhow::Result;
use reconcile::{ThemeReconciler, ThemeSpec, ThemeState};
use std::collections::BTreeMap;

use crate::Context;
use crate::cli::PackageCommand;
use crate::state::TrackedSite;

fn themes(site: &mut TrackedSite) -> &mut BTreeMap<String, ThemeState> {
    &mut site.themes
}

pub fn run(ctx: &Context, cmd: PackageCommand) -> Result<()> {
    let reconciler = ThemeReconciler::new(ctx.client())
        .with_settle(ctx.config.theme_settle())
        .with_fallbacks(ctx.config.themes.fallbacks.clone());

    match cmd {
        PackageCommand::Apply { slug, active, inactive } => {
            let mut desired = ThemeSpec::new(&slug);
            desired.active = PackageCommand::requested_activation(active, inactive);
            super::apply(ctx, &reconciler, &slug, &desired, themes)
        }
        PackageCommand::Read { slug } => super::read(ctx, &reconciler, &slug, themes),
        PackageCommand::Remove { slug } => super::remove(ctx, &reconciler, &slug, themes),
    }
}
