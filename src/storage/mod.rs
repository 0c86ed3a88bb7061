//! Session store adaptor.
//!
//! The only layer that touches the key-value backend. Everything above
//! depends on the [`SessionStore`] trait, not the backend client. Absence
//! is `Ok(None)`/empty-`Vec`; backend failure is `AuthError::StoreUnavailable`.

pub mod memory;
pub mod redis;

use crate::error::AuthError;
use crate::session::{AuthId, SessionId, SessionRecord};
use async_trait::async_trait;

pub use memory::MemorySessionStore;
pub use redis::RedisSessionStore;

/// Typed access to the session backend.
///
/// Each record lives under two independent paths: a point entry keyed by
/// session ID (TTL-bound) and a field of the per-principal hash (no TTL).
/// The two are written with separate calls; `put` writes the point entry
/// first, so a partial failure leaves a session that validates but does not
/// enumerate — never the reverse.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Write a record under both index paths.
    async fn put(&self, record: &SessionRecord) -> Result<(), AuthError>;

    /// Point lookup. `None` means unknown or expired, not an error.
    async fn get_by_session_id(&self, id: &SessionId)
        -> Result<Option<SessionRecord>, AuthError>;

    /// Targeted lookup within one principal's session set.
    async fn get_by_auth_id_field(
        &self,
        auth_id: &AuthId,
        field: &str,
    ) -> Result<Option<SessionRecord>, AuthError>;

    /// Enumerate all sessions recorded for a principal.
    async fn list_by_auth_id(&self, auth_id: &AuthId) -> Result<Vec<SessionRecord>, AuthError>;

    /// Remove a point entry. True iff something existed and was removed.
    async fn delete_by_session_id(&self, id: &SessionId) -> Result<bool, AuthError>;

    /// Remove a principal's entire hash. True iff it existed.
    async fn delete_auth_id_entry(&self, auth_id: &AuthId) -> Result<bool, AuthError>;

    /// Bulk point-entry removal; returns the number actually deleted.
    async fn delete_many_by_session_id(&self, ids: &[SessionId]) -> Result<u64, AuthError>;

    /// Remove specific fields from a principal's hash without deleting the
    /// hash itself; returns the number removed.
    async fn delete_auth_id_fields(
        &self,
        auth_id: &AuthId,
        fields: &[String],
    ) -> Result<u64, AuthError>;
}

pub(crate) fn session_key(id: &SessionId) -> String {
    format!("session:{}", id)
}

pub(crate) fn principal_key(auth_id: &AuthId) -> String {
    format!("principal:{}", auth_id)
}
