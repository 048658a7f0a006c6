//! Repository Traits
//!
//! Interface for session persistence. Implementation is in the
//! infrastructure layer.

use crate::domain::entity::session_record::SessionRecord;
use crate::error::SessionResult;
use kernel::id::SessionId;

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Persist a new session record
    async fn create(&self, record: &SessionRecord) -> SessionResult<()>;

    /// Find a live session by id.
    ///
    /// Returns `None` both when the id is absent and when the record has
    /// expired; an expired record is deleted before returning.
    async fn get(&self, session_id: SessionId) -> SessionResult<Option<SessionRecord>>;

    /// Delete a session
    async fn delete(&self, session_id: SessionId) -> SessionResult<()>;

    /// Remove all expired sessions, returning the count removed
    async fn cleanup_expired(&self) -> SessionResult<u64>;
}
