//! Forced-Logout Escalation Handler
//!
//! Bridges the security monitor to the forced-logout path: a `Critical`
//! escalation clears the client cache, invalidates the server session,
//! and navigates to the unauthenticated entry point, synchronously.

use std::sync::{Arc, Mutex};

use platform::monitor::{Escalation, EscalationHandler, Severity};

use crate::application::cache::CredentialCache;
use crate::application::refresh::forced_logout;
use crate::domain::repository::LogoutHooks;

/// Escalation handler implementing the forced-logout action.
///
/// The cache slot is wired after construction: the cache itself reports to
/// the monitor, so it cannot exist before the monitor does.
pub struct ForcedLogoutEscalation {
    cache: Mutex<Option<Arc<CredentialCache>>>,
    hooks: Arc<dyn LogoutHooks>,
}

impl ForcedLogoutEscalation {
    pub fn new(hooks: Arc<dyn LogoutHooks>) -> Self {
        Self {
            cache: Mutex::new(None),
            hooks,
        }
    }

    /// Attach the cache once it exists
    pub fn set_cache(&self, cache: Arc<CredentialCache>) {
        let mut slot = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(cache);
    }
}

impl EscalationHandler for ForcedLogoutEscalation {
    fn on_escalation(&self, escalation: &Escalation) {
        if escalation.severity < Severity::Critical {
            return;
        }

        tracing::error!(
            kind = escalation.kind.as_str(),
            reason = escalation.reason,
            "Critical escalation; forcing logout"
        );

        let cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        match cache {
            Some(cache) => forced_logout(&cache, self.hooks.as_ref()),
            None => {
                // No cache wired yet; still tear down what exists
                self.hooks.invalidate_server_session();
                self.hooks.clear_session_cookie();
                self.hooks.navigate_to_entry();
            }
        }
    }
}
