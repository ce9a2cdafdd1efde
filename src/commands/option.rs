use anyhow::Result;
use reconcile::{OptionReconciler, Reconciler, WpOption};

use crate::Context;
use crate::cli::OptionCommand;
use crate::state::SiteState;
use crate::ui;

pub fn run(ctx: &Context, cmd: OptionCommand) -> Result<()> {
    let reconciler = OptionReconciler::new(ctx.client());

    match cmd {
        OptionCommand::Set { name, value } => set(ctx, &reconciler, &name, &value),
        OptionCommand::Get { name } => get(ctx, &reconciler, &name),
        OptionCommand::Delete { name } => delete(ctx, &reconciler, &name),
    }
}

fn tracked(state: &SiteState, ctx: &Context, name: &str) -> Option<WpOption> {
    state
        .site(&ctx.profile)
        .and_then(|site| site.options.get(name))
        .map(|value| WpOption::new(name, value.as_str()))
}

fn set(ctx: &Context, reconciler: &OptionReconciler, name: &str, value: &str) -> Result<()> {
    let mut state = SiteState::load_from(&ctx.state_path)?;
    let prior = tracked(&state, ctx, name);

    ui::header(&format!("Setting option {name}"));
    let result = reconciler.apply(&ctx.profile, &WpOption::new(name, value), prior.as_ref());
    let observed = super::report(ctx, &format!("option {name}"), result)?;

    ui::kv(name, &observed.state.value);
    state
        .site_mut(&ctx.profile)
        .options
        .insert(name.to_string(), observed.state.value);
    state.touch(&ctx.state_path)?;

    ui::success(&format!("Option {name} set"));
    Ok(())
}

/// Print the current value. A tracked option that has disappeared stops
/// being tracked; untracked options are only read.
fn get(ctx: &Context, reconciler: &OptionReconciler, name: &str) -> Result<()> {
    let mut state = SiteState::load_from(&ctx.state_path)?;

    let Some(prior) = tracked(&state, ctx, name) else {
        match reconciler.get(&ctx.profile, name).map_err(|err| super::explain(ctx, err))? {
            Some(value) => ui::kv(name, &value),
            None => ui::dim(&format!("{name} is not set")),
        }
        return Ok(());
    };

    let found = reconciler
        .read(&ctx.profile, &prior)
        .map_err(|err| super::explain(ctx, err))?;
    let options = &mut state.site_mut(&ctx.profile).options;
    match found {
        Some(observed) => {
            ui::kv(name, &observed.state.value);
            if observed.state.value != prior.value {
                ui::warn(&format!("{name} changed on the site since it was last set"));
            }
            options.insert(name.to_string(), observed.state.value);
        }
        None => {
            options.remove(name);
            ui::warn(&format!("option {name} no longer exists; stopped tracking it"));
        }
    }

    state.prune();
    state.touch(&ctx.state_path)
}

/// Delete on the site whether or not it is tracked.
fn delete(ctx: &Context, reconciler: &OptionReconciler, name: &str) -> Result<()> {
    let mut state = SiteState::load_from(&ctx.state_path)?;
    let prior = tracked(&state, ctx, name).unwrap_or_else(|| WpOption::new(name, ""));

    ui::header(&format!("Deleting option {name}"));
    let result = reconciler.delete(&ctx.profile, &prior);
    super::report(ctx, &format!("option {name}"), result)?;

    state.site_mut(&ctx.profile).options.remove(name);
    state.prune();
    state.touch(&ctx.state_path)?;

    ui::success(&format!("Option {name} deleted"));
    Ok(())
}
