//! Refresh Scheduler
//!
//! Schedules a single renewal attempt ahead of token expiry, stores the
//! renewed credential, and re-schedules for the new expiry. A failed
//! refresh is not retried: the forced-logout path runs instead.
//!
//! The scheduler sleeps in watchdog-sized slices and re-reads the wall
//! clock on every tick, so a deadline that passes while the device sleeps
//! fires on the first tick after wake rather than being silently missed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use kernel::token::CredentialToken;

use crate::application::cache::CredentialCache;
use crate::application::config::VaultConfig;
use crate::domain::repository::{LogoutHooks, TokenRefresher};

/// Handle to a scheduled refresh.
///
/// `cancel` is idempotent and safe to call after the timer has fired;
/// aborting a finished task is a no-op.
pub struct CancellableHandle {
    cancelled: Arc<AtomicBool>,
    abort: tokio::task::AbortHandle,
}

impl CancellableHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Schedules credential renewal against an injected refresh collaborator
pub struct RefreshScheduler<R>
where
    R: TokenRefresher + Send + Sync + 'static,
{
    cache: Arc<CredentialCache>,
    refresher: Arc<R>,
    hooks: Arc<dyn LogoutHooks>,
    config: Arc<VaultConfig>,
}

impl<R> RefreshScheduler<R>
where
    R: TokenRefresher + Send + Sync + 'static,
{
    pub fn new(
        cache: Arc<CredentialCache>,
        refresher: Arc<R>,
        hooks: Arc<dyn LogoutHooks>,
        config: Arc<VaultConfig>,
    ) -> Self {
        Self {
            cache,
            refresher,
            hooks,
            config,
        }
    }

    /// Schedule renewal for the given token.
    ///
    /// The refresh fires `refresh_lead` before expiry, or immediately when
    /// that moment has already passed. On success the new credential is
    /// stored and renewal re-scheduled; on failure the forced-logout path
    /// runs and the task ends.
    pub fn schedule_for(&self, token: &CredentialToken) -> CancellableHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let cache = self.cache.clone();
        let refresher = self.refresher.clone();
        let hooks = self.hooks.clone();
        let config = self.config.clone();
        let mut current = token.clone();

        let task = tokio::spawn(async move {
            loop {
                let target_ms = current.expires_at_ms() - config.refresh_lead_ms();

                loop {
                    if flag.load(Ordering::SeqCst) {
                        return;
                    }
                    let now_ms = Utc::now().timestamp_millis();
                    if now_ms >= target_ms {
                        break;
                    }
                    let remaining = Duration::from_millis((target_ms - now_ms) as u64);
                    tokio::time::sleep(remaining.min(config.watchdog_interval)).await;
                }

                if flag.load(Ordering::SeqCst) {
                    return;
                }

                match refresher.refresh(&current).await {
                    Ok(new_token) => match cache.store(&new_token) {
                        Ok(()) => {
                            tracing::info!(
                                subject = %new_token.subject(),
                                expires_at_ms = new_token.expires_at_ms(),
                                "Credential refreshed"
                            );
                            current = new_token;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Storing refreshed credential failed");
                            forced_logout(&cache, hooks.as_ref());
                            return;
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "Credential refresh failed; forcing logout");
                        forced_logout(&cache, hooks.as_ref());
                        return;
                    }
                }
            }
        });

        CancellableHandle {
            cancelled,
            abort: task.abort_handle(),
        }
    }
}

/// The forced-logout path: clear the client cache, tear down the server
/// half, and send the UI to the unauthenticated entry point.
///
/// Every step runs regardless of the others.
pub fn forced_logout(cache: &CredentialCache, hooks: &dyn LogoutHooks) {
    tracing::warn!("Forced logout");
    cache.clear();
    hooks.invalidate_server_session();
    hooks.clear_session_cookie();
    hooks.navigate_to_entry();
}
