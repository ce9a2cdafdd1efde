use anyhow::Result;
use reconcile::{UserReconciler, UserSpec, UserState};
use std::collections::BTreeMap;

use crate::Context;
use crate::cli::{UserArgs, UserCommand};
use crate::state::TrackedSite;
use crate::ui;

fn users(site: &mut TrackedSite) -> &mut BTreeMap<String, UserState> {
    &mut site.users
}

impl From<UserArgs> for UserSpec {
    fn from(args: UserArgs) -> Self {
        Self {
            username: args.username,
            email: args.email,
            password: args.password,
            role: args.role,
            display_name: args.display_name,
            first_name: args.first_name,
            last_name: args.last_name,
        }
    }
}

pub fn run(ctx: &Context, cmd: UserCommand) -> Result<()> {
    let reconciler = UserReconciler::new(ctx.client());

    match cmd {
        UserCommand::Apply(args) => {
            let desired = UserSpec::from(args);
            super::apply(ctx, &reconciler, &desired.username.clone(), &desired, users)
        }
        UserCommand::Read { username } => super::read(ctx, &reconciler, &username, users),
        UserCommand::Show { username, json } => show(ctx, &reconciler, &username, json),
        UserCommand::Remove { username } => super::remove(ctx, &reconciler, &username, users),
    }
}

/// Look up any user on the site, tracked or not.
fn show(ctx: &Context, reconciler: &UserReconciler, username: &str, json: bool) -> Result<()> {
    let info = reconciler
        .lookup(&ctx.profile, username)
        .map_err(|err| super::explain(ctx, err))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        ui::header(&format!("User {username}"));
        super::show(&info);
    }
    Ok(())
}
