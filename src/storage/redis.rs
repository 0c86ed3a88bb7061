//! Redis-backed session store.
//!
//! Point entries are written with `SET .. EX` so they self-expire with the
//! token; the principal hash is written without a TTL, which is what keeps
//! refresh possible after the point entry has lapsed. Every call is bounded
//! by the configured per-operation timeout and reports an elapsed timeout
//! as `StoreUnavailable`.

use crate::error::AuthError;
use crate::session::{AuthId, SessionId, SessionRecord};
use crate::storage::{principal_key, session_key, SessionStore};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Session store over a Redis connection manager.
pub struct RedisSessionStore {
    conn: Arc<RwLock<ConnectionManager>>,
    op_timeout: Duration,
}

impl RedisSessionStore {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the client cannot be created or the
    /// initial connection fails.
    pub async fn new(redis_url: &str, op_timeout: Duration) -> Result<Self, AuthError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(RedisSessionStore {
            conn: Arc::new(RwLock::new(conn)),
            op_timeout,
        })
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, redis::RedisError>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(res) => res.map_err(AuthError::from),
            Err(_) => Err(AuthError::StoreUnavailable(
                "operation timed out".to_string(),
            )),
        }
    }
}

fn parse_record(raw: &str) -> Result<SessionRecord, AuthError> {
    serde_json::from_str(raw).map_err(|e| AuthError::Internal(format!("bad stored record: {}", e)))
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, record: &SessionRecord) -> Result<(), AuthError> {
        let value = serde_json::to_string(record)
            .map_err(|e| AuthError::Internal(format!("serialization failed: {}", e)))?;
        let ttl = record.ttl().as_secs().max(1);

        let mut conn = self.conn.write().await;
        self.bounded(conn.set_ex::<_, _, ()>(session_key(&record.session_id), &value, ttl))
            .await?;
        self.bounded(conn.hset::<_, _, _, ()>(
            principal_key(&record.auth_id),
            &record.session_secret,
            &value,
        ))
        .await?;
        Ok(())
    }

    async fn get_by_session_id(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, AuthError> {
        let mut conn = self.conn.write().await;
        let raw: Option<String> = self.bounded(conn.get(session_key(id))).await?;
        raw.as_deref().map(parse_record).transpose()
    }

    async fn get_by_auth_id_field(
        &self,
        auth_id: &AuthId,
        field: &str,
    ) -> Result<Option<SessionRecord>, AuthError> {
        let mut conn = self.conn.write().await;
        let raw: Option<String> = self
            .bounded(conn.hget(principal_key(auth_id), field))
            .await?;
        raw.as_deref().map(parse_record).transpose()
    }

    async fn list_by_auth_id(&self, auth_id: &AuthId) -> Result<Vec<SessionRecord>, AuthError> {
        let mut conn = self.conn.write().await;
        let raw: HashMap<String, String> =
            self.bounded(conn.hgetall(principal_key(auth_id))).await?;

        raw.values().map(|v| parse_record(v)).collect()
    }

    async fn delete_by_session_id(&self, id: &SessionId) -> Result<bool, AuthError> {
        let mut conn = self.conn.write().await;
        let removed: i64 = self.bounded(conn.del(session_key(id))).await?;
        Ok(removed > 0)
    }

    async fn delete_auth_id_entry(&self, auth_id: &AuthId) -> Result<bool, AuthError> {
        let mut conn = self.conn.write().await;
        let removed: i64 = self.bounded(conn.del(principal_key(auth_id))).await?;
        Ok(removed > 0)
    }

    async fn delete_many_by_session_id(&self, ids: &[SessionId]) -> Result<u64, AuthError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let keys: Vec<String> = ids.iter().map(session_key).collect();
        let mut conn = self.conn.write().await;
        let removed: i64 = self.bounded(conn.del(keys)).await?;
        Ok(removed.max(0) as u64)
    }

    async fn delete_auth_id_fields(
        &self,
        auth_id: &AuthId,
        fields: &[String],
    ) -> Result<u64, AuthError> {
        if fields.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.write().await;
        let removed: i64 = self
            .bounded(conn.hdel(principal_key(auth_id), fields.to_vec()))
            .await?;
        Ok(removed.max(0) as u64)
    }
}
