use anyhow::Result;
use reconcile::{PluginReconciler, PluginSpec, PluginState};
use std::collections::BTreeMap;

use crate::Context;
use crate::cli::PackageCommand;
use crate::state::TrackedSite;

fn plugins(site: &mut TrackedSite) -> &mut BTreeMap<String, PluginState> {
    &mut site.plugins
}

pub fn run(ctx: &Context, cmd: PackageCommand) -> Result<()> {
    let reconciler = PluginReconciler::new(ctx.client()).with_settle(ctx.config.plugin_settle());

    match cmd {
        PackageCommand::Apply { slug, active, inactive } => {
            let mut desired = PluginSpec::new(&slug);
            desired.active = PackageCommand::requested_activation(active, inactive);
            super::apply(ctx, &reconciler, &slug, &desired, plugins)
        }
        PackageCommand::Read { slug } => super::read(ctx, &reconciler, &slug, plugins),
        PackageCommand::Remove { slug } => super::remove(ctx, &reconciler, &slug, plugins),
    }
}
