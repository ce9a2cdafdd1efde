//! # reconcile
//!
//! Converge a WordPress site to a declared state through wp-cli.
//!
//! Each object kind has a reconciler implementing [`Reconciler`]:
//!
//! - [`PluginReconciler`]: install, activate/deactivate, delete
//! - [`ThemeReconciler`]: the same, under the one-active-theme rule
//! - [`OptionReconciler`]: a single `wp_options` entry
//! - [`SiteSettingsReconciler`]: the general settings as one record
//! - [`UserReconciler`]: user accounts, plus a read-only [`lookup`](UserReconciler::lookup)
//!
//! ## Core Concepts
//!
//! - **Observed state** is always re-read from the site after a mutation.
//!   A wp-cli success is never taken as proof; the recorded value is what
//!   the site reports afterwards, even when it differs from the request.
//! - **Warnings** cover requests the site itself refuses (a theme that has
//!   to stay active). The operation succeeds and says why.
//! - **Absence** on read is `Ok(None)`, not an error. The caller should stop
//!   tracking the object.
//!
//! ## Example
//!
//! ```no_run
//! use reconcile::{Outcome, Reconciler, ThemeReconciler, ThemeSpec};
//! use wpcli::{Client, ConnectionProfile};
//!
//! let themes = ThemeReconciler::new(Client::new());
//! let profile = ConnectionProfile::local().with_ssh_target("deploy@web1");
//!
//! let result = themes.create(&profile, &ThemeSpec::new("astra").with_active(false));
//! match Outcome::of(&result) {
//!     Outcome::Success => println!("done"),
//!     Outcome::Warning => println!("done with warnings"),
//!     Outcome::Error => println!("failed"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fallback;
pub mod option;
pub mod plugin;
pub mod resource;
pub mod site_settings;
pub mod theme;
pub mod types;
pub mod user;

// Re-export main types at crate root
pub use error::{ReconcileError, Result};
pub use fallback::{Candidates, DEFAULT_FALLBACK_THEMES, Replacement, activate_replacement};
pub use option::{OptionReconciler, WpOption};
pub use plugin::{PluginReconciler, PluginSpec, PluginState};
pub use resource::Reconciler;
pub use site_settings::{SiteSettings, SiteSettingsReconciler};
pub use theme::{ThemeReconciler, ThemeSpec, ThemeState};
pub use types::{Observed, Outcome, Removal, Warning};
pub use user::{UserInfo, UserReconciler, UserSpec, UserState};
