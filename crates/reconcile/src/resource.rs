//! Lifecycle trait implemented by every reconciler.
//!
//! A reconciler drives wp-cli until the site matches a desired record, then
//! reports what the site actually shows. It holds no state between calls
//! other than its [`Client`](wpcli::Client) and settle policy; the
//! connection profile and prior observed state come in with each call.

use crate::error::Result;
use crate::types::{Observed, Removal};
use wpcli::ConnectionProfile;

/// Create/read/update/delete for one kind of WordPress object.
///
/// # Example
///
/// ```no_run
/// use reconcile::{PluginReconciler, PluginSpec, Reconciler};
/// use wpcli::{Client, ConnectionProfile};
///
/// let plugins = PluginReconciler::new(Client::new());
/// let profile = ConnectionProfile::local().with_remote_path("/var/www/html");
///
/// let observed = plugins.create(&profile, &PluginSpec::new("akismet").with_active(false))?;
/// // the site may have activated it anyway; `state` is what it shows now
/// println!("akismet active: {}", observed.state.active);
/// # Ok::<(), reconcile::ReconcileError>(())
/// ```
pub trait Reconciler {
    /// Record the caller wants applied
    type Desired;
    /// Record read back from the site
    type State;

    /// Resource type name, for logs and tracked state
    fn kind(&self) -> &'static str;

    /// Bring a new object into existence and converge it.
    fn create(&self, profile: &ConnectionProfile, desired: &Self::Desired) -> Result<Observed<Self::State>>;

    /// Re-derive the state of a tracked object.
    ///
    /// Returns `Ok(None)` when the object no longer exists on the site.
    fn read(&self, profile: &ConnectionProfile, prior: &Self::State) -> Result<Option<Observed<Self::State>>>;

    /// Converge an existing object from its prior observed state.
    fn update(
        &self,
        profile: &ConnectionProfile,
        desired: &Self::Desired,
        prior: &Self::State,
    ) -> Result<Observed<Self::State>>;

    /// Remove the object, or explain why it had to stay.
    fn delete(&self, profile: &ConnectionProfile, prior: &Self::State) -> Result<Observed<Removal>>;

    /// Create when nothing is tracked yet, update otherwise.
    fn apply(
        &self,
        profile: &ConnectionProfile,
        desired: &Self::Desired,
        prior: Option<&Self::State>,
    ) -> Result<Observed<Self::State>> {
        match prior {
            Some(prior) => self.update(profile, desired, prior),
            None => self.create(profile, desired),
        }
    }
}
