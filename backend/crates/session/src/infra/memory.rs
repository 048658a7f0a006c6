//! In-Memory Session Store
//!
//! Concurrent map from session id to record behind one coarse mutex.
//! Session volume is modest, so a single lock over the whole map keeps the
//! race surface small; the lock is never held across I/O. Expired records
//! are removed both lazily on `get` and by the periodic sweeper.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use kernel::id::SessionId;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entity::session_record::SessionRecord;
use crate::domain::repository::SessionRepository;
use crate::error::SessionResult;

/// In-memory session repository
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    inner: Arc<Mutex<HashMap<Uuid, SessionRecord>>>,
    sweeper_started: Arc<AtomicBool>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, expired or not
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Start the background sweeper.
    ///
    /// Started at most once per store; subsequent calls return `None`.
    pub fn spawn_sweeper(&self, interval: Duration) -> Option<SweepHandle> {
        if self.sweeper_started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Session sweeper already running");
            return None;
        }

        let store = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await; // immediate first tick

            loop {
                ticker.tick().await;
                if let Err(e) = store.cleanup_expired().await {
                    tracing::warn!(error = %e, "Session sweep failed");
                }
            }
        });

        Some(SweepHandle {
            abort: task.abort_handle(),
        })
    }
}

impl SessionRepository for InMemorySessionStore {
    async fn create(&self, record: &SessionRecord) -> SessionResult<()> {
        let mut map = self.inner.lock().await;
        map.insert(record.session_id.into_uuid(), record.clone());
        Ok(())
    }

    async fn get(&self, session_id: SessionId) -> SessionResult<Option<SessionRecord>> {
        let mut map = self.inner.lock().await;

        match map.get(session_id.as_uuid()) {
            None => Ok(None),
            Some(record) if record.is_expired() => {
                map.remove(session_id.as_uuid());
                tracing::debug!(session_id = %session_id, "Expired session removed on lookup");
                Ok(None)
            }
            Some(record) => Ok(Some(record.clone())),
        }
    }

    async fn delete(&self, session_id: SessionId) -> SessionResult<()> {
        let mut map = self.inner.lock().await;
        map.remove(session_id.as_uuid());
        Ok(())
    }

    async fn cleanup_expired(&self) -> SessionResult<u64> {
        let now_ms = Utc::now().timestamp_millis();
        let mut map = self.inner.lock().await;

        let before = map.len();
        map.retain(|_, record| !record.is_expired_at(now_ms));
        let removed = (before - map.len()) as u64;

        if removed > 0 {
            tracing::info!(sessions_deleted = removed, "Cleaned up expired sessions");
        }

        Ok(removed)
    }
}

/// Handle for the background sweeper task
pub struct SweepHandle {
    abort: tokio::task::AbortHandle,
}

impl SweepHandle {
    /// Stop the sweeper. Idempotent.
    pub fn cancel(&self) {
        self.abort.abort();
    }
}
