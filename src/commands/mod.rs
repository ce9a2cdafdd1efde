//! Command implementations.
//!
//! Every mutating command follows the same cycle: load tracked state, hand
//! the prior record (if any) to a reconciler, print the outcome, store what
//! the site reported and save.

pub mod option;
pub mod plugin;
pub mod settings;
pub mod state;
pub mod theme;
pub mod user;

use anyhow::{Result, bail};
use reconcile::{Observed, Outcome, ReconcileError, Reconciler, Warning};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::Context;
use crate::state::{SiteState, TrackedSite};
use crate::ui;

/// Where a record kind lives inside a site's tracked state
pub type Slot<S> = fn(&mut TrackedSite) -> &mut BTreeMap<String, S>;

/// Print warnings, or advice for a failure.
pub fn report<T>(ctx: &Context, what: &str, result: reconcile::Result<Observed<T>>) -> Result<Observed<T>> {
    log::debug!("{what}: {:?}", Outcome::of(&result));

    match result {
        Ok(observed) => {
            print_warnings(&observed.warnings);
            Ok(observed)
        }
        Err(err) => Err(explain(ctx, err)),
    }
}

fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        ui::warn(&warning.to_string());
    }
}

/// Add advice for classified tool failures.
///
/// The raw output is already part of the error message.
pub fn explain(ctx: &Context, err: ReconcileError) -> anyhow::Error {
    if let Some(category) = err.category()
        && !ctx.quiet
    {
        ui::dim(&format!("{}: {}", category.description(), category.advice()));
    }
    err.into()
}

/// Print the fields of a record as key/value lines.
pub fn show<T: Serialize>(record: &T) {
    let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(record) else {
        return;
    };

    for (key, value) in fields {
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => continue,
            other => other.to_string(),
        };
        ui::kv(&key, &text);
    }
}

/// Create or update `key`, then store what the site reported.
pub fn apply<R>(ctx: &Context, reconciler: &R, key: &str, desired: &R::Desired, slot: Slot<R::State>) -> Result<()>
where
    R: Reconciler,
    R::State: Clone + Serialize,
{
    let mut state = SiteState::load_from(&ctx.state_path)?;
    let prior = slot(state.site_mut(&ctx.profile)).get(key).cloned();

    let verb = if prior.is_some() { "Updating" } else { "Creating" };
    ui::header(&format!("{verb} {} {key}", reconciler.kind()));
    ui::kv("Site", &ctx.profile.label());

    let result = reconciler.apply(&ctx.profile, desired, prior.as_ref());
    let observed = report(ctx, &format!("{} {key}", reconciler.kind()), result)?;

    show(&observed.state);
    slot(state.site_mut(&ctx.profile)).insert(key.to_string(), observed.state);
    state.touch(&ctx.state_path)?;

    ui::success(&format!("{} {key} converged", reconciler.kind()));
    Ok(())
}

/// Re-read a tracked record. Stops tracking it if it is gone from the site.
pub fn read<R>(ctx: &Context, reconciler: &R, key: &str, slot: Slot<R::State>) -> Result<()>
where
    R: Reconciler,
    R::State: Clone + Serialize,
{
    let mut state = SiteState::load_from(&ctx.state_path)?;
    let Some(prior) = slot(state.site_mut(&ctx.profile)).get(key).cloned() else {
        bail!("{} '{key}' is not tracked for {}", reconciler.kind(), ctx.profile);
    };

    let found = reconciler
        .read(&ctx.profile, &prior)
        .map_err(|err| explain(ctx, err))?;

    let records = slot(state.site_mut(&ctx.profile));
    match found {
        Some(observed) => {
            print_warnings(&observed.warnings);
            show(&observed.state);
            records.insert(key.to_string(), observed.state);
            ui::success(&format!("{} {key} is present", reconciler.kind()));
        }
        None => {
            records.remove(key);
            ui::warn(&format!("{} {key} no longer exists; stopped tracking it", reconciler.kind()));
        }
    }

    state.prune();
    state.touch(&ctx.state_path)
}

/// Delete a tracked record from the site and stop tracking it.
pub fn remove<R>(ctx: &Context, reconciler: &R, key: &str, slot: Slot<R::State>) -> Result<()>
where
    R: Reconciler,
    R::State: Clone,
{
    let mut state = SiteState::load_from(&ctx.state_path)?;
    let Some(prior) = slot(state.site_mut(&ctx.profile)).get(key).cloned() else {
        bail!("{} '{key}' is not tracked for {}", reconciler.kind(), ctx.profile);
    };

    ui::header(&format!("Removing {} {key}", reconciler.kind()));
    let result = reconciler.delete(&ctx.profile, &prior);
    let observed = report(ctx, &format!("{} {key}", reconciler.kind()), result)?;

    slot(state.site_mut(&ctx.profile)).remove(key);
    state.prune();
    state.touch(&ctx.state_path)?;

    if observed.state.is_removed() {
        ui::success(&format!("Removed {} {key}", reconciler.kind()));
    } else {
        ui::dim("Left in place on the site; no longer tracked");
    }
    Ok(())
}
