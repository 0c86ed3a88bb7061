//! In-memory session store for tests and local development.
//!
//! Mirrors the Redis layout: a point map that honors expiry on read (the
//! stand-in for key TTL) and a per-principal hash with no expiry.

use crate::error::AuthError;
use crate::session::{AuthId, SessionId, SessionRecord};
use crate::storage::SessionStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Session store backed by process-local maps.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    principals: RwLock<HashMap<String, HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, record: &SessionRecord) -> Result<(), AuthError> {
        self.sessions
            .write()
            .await
            .insert(record.session_id.0.clone(), record.clone());
        self.principals
            .write()
            .await
            .entry(record.auth_id.0.clone())
            .or_default()
            .insert(record.session_secret.clone(), record.clone());
        Ok(())
    }

    async fn get_by_session_id(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, AuthError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&id.0)
            .filter(|r| r.expires_at > Utc::now())
            .cloned())
    }

    async fn get_by_auth_id_field(
        &self,
        auth_id: &AuthId,
        field: &str,
    ) -> Result<Option<SessionRecord>, AuthError> {
        let principals = self.principals.read().await;
        Ok(principals
            .get(&auth_id.0)
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    async fn list_by_auth_id(&self, auth_id: &AuthId) -> Result<Vec<SessionRecord>, AuthError> {
        let principals = self.principals.read().await;
        Ok(principals
            .get(&auth_id.0)
            .map(|fields| fields.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_by_session_id(&self, id: &SessionId) -> Result<bool, AuthError> {
        Ok(self.sessions.write().await.remove(&id.0).is_some())
    }

    async fn delete_auth_id_entry(&self, auth_id: &AuthId) -> Result<bool, AuthError> {
        Ok(self.principals.write().await.remove(&auth_id.0).is_some())
    }

    async fn delete_many_by_session_id(&self, ids: &[SessionId]) -> Result<u64, AuthError> {
        let mut sessions = self.sessions.write().await;
        let mut removed = 0;
        for id in ids {
            if sessions.remove(&id.0).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn delete_auth_id_fields(
        &self,
        auth_id: &AuthId,
        fields: &[String],
    ) -> Result<u64, AuthError> {
        let mut principals = self.principals.write().await;
        let Some(entry) = principals.get_mut(&auth_id.0) else {
            return Ok(0);
        };
        let mut removed = 0;
        for field in fields {
            if entry.remove(field).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
