//! WordPress users.
//!
//! Users are created and updated field by field, but read only checks that
//! the account still exists; field drift is not reconciled on read. The
//! password is write-only and never part of the observed state.

use crate::error::{ReconcileError, Result};
use crate::resource::Reconciler;
use crate::types::{Observed, Removal};
use serde::{Deserialize, Serialize};
use wpcli::{Client, ConnectionProfile, Presence};

/// Desired user account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    /// Login name
    pub username: String,
    /// Email address; required on create, left unchanged on update when
    /// `None`
    #[serde(default)]
    pub email: Option<String>,
    /// Password; empty means "let wp-cli generate one" on create and
    /// "leave unchanged" on update
    pub password: String,
    /// Role slug (`administrator`, `editor`, ...); required on create, left
    /// unchanged on update when `None`
    #[serde(default)]
    pub role: Option<String>,
    /// Public display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// First name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name
    #[serde(default)]
    pub last_name: Option<String>,
}

impl std::fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSpec")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("display_name", &self.display_name)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

impl UserSpec {
    fn optional_flags(&self) -> Vec<String> {
        [
            ("display_name", &self.display_name),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ]
        .into_iter()
        .filter_map(|(flag, value)| value.as_ref().map(|v| format!("--{flag}={v}")))
        .collect()
    }
}

/// Tracked user record (no password).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    /// Login name
    pub username: String,
    /// Email address
    pub email: String,
    /// Role slug
    pub role: String,
    /// Public display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// First name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserState {
    /// Record after `spec` was written over `self`. Fields the spec leaves
    /// out keep their tracked value.
    fn updated_with(&self, spec: &UserSpec) -> Self {
        let or_prior = |value: &Option<String>, prior: &Option<String>| value.clone().or_else(|| prior.clone());

        Self {
            username: spec.username.clone(),
            email: spec.email.clone().unwrap_or_else(|| self.email.clone()),
            role: spec.role.clone().unwrap_or_else(|| self.role.clone()),
            display_name: or_prior(&spec.display_name, &self.display_name),
            first_name: or_prior(&spec.first_name, &self.first_name),
            last_name: or_prior(&spec.last_name, &self.last_name),
        }
    }
}

/// Profile fields of an existing user, as returned by [`UserReconciler::lookup`].
///
/// Fields that could not be read are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Login name
    pub username: String,
    /// `user_email`
    pub email: String,
    /// `roles`, comma-separated as wp-cli prints them
    pub roles: String,
    /// `display_name`
    pub display_name: String,
    /// `first_name`
    pub first_name: String,
    /// `last_name`
    pub last_name: String,
}

/// Creates, updates and deletes users.
#[derive(Debug, Clone)]
pub struct UserReconciler {
    client: Client,
}

impl UserReconciler {
    /// Create a reconciler.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn presence(&self, profile: &ConnectionProfile, username: &str) -> Result<Presence> {
        self.client
            .presence(profile, &["user", "get", username])
            .map_err(ReconcileError::tool("Failed to check whether user exists"))
    }

    /// Read the profile fields of an existing user.
    ///
    /// A missing user is an error here. Each field is read with
    /// `user get --field`, then `user meta get`; a field neither returns is
    /// left empty.
    pub fn lookup(&self, profile: &ConnectionProfile, username: &str) -> Result<UserInfo> {
        let presence = self.presence(profile, username)?;
        if !presence.present {
            return Err(ReconcileError::verification(
                "User not found",
                format!("no user with login {username}"),
                presence.output,
            ));
        }

        Ok(UserInfo {
            username: username.to_string(),
            email: self.field(profile, username, "user_email"),
            roles: self.field(profile, username, "roles"),
            display_name: self.field(profile, username, "display_name"),
            first_name: self.field(profile, username, "first_name"),
            last_name: self.field(profile, username, "last_name"),
        })
    }

    fn field(&self, profile: &ConnectionProfile, username: &str, field: &str) -> String {
        let flag = format!("--field={field}");
        let direct = self.client.run_captured(profile, &["user", "get", username, flag.as_str()]);
        if direct.success {
            return direct.output.trim().to_string();
        }

        let meta = self.client.run_captured(profile, &["user", "meta", "get", username, field]);
        if meta.success && !meta.output.trim().is_empty() {
            return meta.output.trim().to_string();
        }

        log::debug!("could not read {field} for user {username}: {}", direct.output.trim());
        String::new()
    }
}

impl Reconciler for UserReconciler {
    type Desired = UserSpec;
    type State = UserState;

    fn kind(&self) -> &'static str {
        "user"
    }

    fn create(&self, profile: &ConnectionProfile, desired: &UserSpec) -> Result<Observed<UserState>> {
        let (Some(email), Some(role)) = (&desired.email, &desired.role) else {
            return Err(ReconcileError::invalid(
                "Cannot create WordPress user",
                format!("{} needs both an email and a role", desired.username),
            ));
        };

        let mut args = vec![
            "user".to_string(),
            "create".to_string(),
            desired.username.clone(),
            email.clone(),
        ];
        // without --user_pass wp-cli generates one
        if !desired.password.is_empty() {
            args.push(format!("--user_pass={}", desired.password));
        }
        args.push(format!("--role={role}"));
        args.extend(desired.optional_flags());

        log::info!("creating user {} on {profile}", desired.username);
        self.client
            .run(profile, &args)
            .map_err(ReconcileError::tool("Failed to create WordPress user"))?;

        Ok(Observed::new(UserState {
            username: desired.username.clone(),
            email: email.clone(),
            role: role.clone(),
            display_name: desired.display_name.clone(),
            first_name: desired.first_name.clone(),
            last_name: desired.last_name.clone(),
        }))
    }

    fn read(&self, profile: &ConnectionProfile, prior: &UserState) -> Result<Option<Observed<UserState>>> {
        if self.presence(profile, &prior.username)?.present {
            Ok(Some(Observed::new(prior.clone())))
        } else {
            log::info!("user {} no longer exists on {profile}", prior.username);
            Ok(None)
        }
    }

    fn update(&self, profile: &ConnectionProfile, desired: &UserSpec, prior: &UserState) -> Result<Observed<UserState>> {
        let username = desired.username.as_str();

        // wp-cli needs the password change as its own call
        if !desired.password.is_empty() {
            log::info!("updating password for user {username} on {profile}");
            let pass = format!("--user_pass={}", desired.password);
            self.client
                .run(profile, &["user", "update", username, pass.as_str()])
                .map_err(ReconcileError::tool("Failed to update password"))?;
        }

        let mut flags: Vec<String> = [("user_email", &desired.email), ("role", &desired.role)]
            .into_iter()
            .filter_map(|(flag, value)| value.as_ref().map(|v| format!("--{flag}={v}")))
            .collect();
        flags.extend(desired.optional_flags());

        if flags.is_empty() {
            log::debug!("no profile fields given for user {username}");
        } else {
            let mut args = vec!["user".to_string(), "update".to_string(), username.to_string()];
            args.extend(flags);

            log::info!("updating user {username} on {profile}");
            self.client
                .run(profile, &args)
                .map_err(ReconcileError::tool("Failed to update WordPress user"))?;
        }

        Ok(Observed::new(prior.updated_with(desired)))
    }

    fn delete(&self, profile: &ConnectionProfile, prior: &UserState) -> Result<Observed<Removal>> {
        log::info!("deleting user {} on {profile}", prior.username);
        self.client
            .run(profile, &["user", "delete", prior.username.as_str(), "--yes"])
            .map_err(ReconcileError::tool("Failed to delete WordPress user"))?;

        Ok(Observed::new(Removal::Removed))
    }
}
