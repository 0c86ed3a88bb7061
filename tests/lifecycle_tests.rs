//! End-to-end lifecycle scenarios against the in-memory store.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, SubsecRound, Utc};
use sessiongate::{
    AuthConfig, AuthError, AuthId, MemorySessionStore, SessionId, SessionRecord, SessionStore,
    TokenEngine, TokenInput,
};
use std::sync::Arc;
use std::time::Duration;

fn test_config(validity: Duration) -> AuthConfig {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();
    AuthConfig::new(b"test-signing-key".to_vec(), [9u8; 32], validity).unwrap()
}

fn test_engine(validity: Duration) -> (TokenEngine, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    let engine = TokenEngine::new(&test_config(validity), store.clone());
    (engine, store)
}

#[tokio::test]
async fn issue_then_validate() {
    let (engine, _) = test_engine(Duration::from_secs(900));

    let response = engine
        .create(&TokenInput::new("u1", "admin"))
        .await
        .unwrap();
    assert!(!response.access_token.is_empty());
    assert!(!response.refresh_key.is_empty());
    assert!(response.expires_at > Utc::now().timestamp());

    let record = engine.validate(&response.access_token).await.unwrap();
    assert_eq!(record.auth_id, AuthId("u1".to_string()));
    assert_eq!(record.role, "admin");
    assert_eq!(record.session_secret, "default");
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let (engine, _) = test_engine(Duration::from_secs(900));

    for input in [
        TokenInput::new("", "admin"),
        TokenInput::new("u1", ""),
        TokenInput::new("u 1", "admin"),
        TokenInput::new("u1", "r".repeat(21)),
    ] {
        let err = engine.create(&input).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)), "{:?}", input);
    }
}

#[tokio::test]
async fn expired_claims_win_over_store_state() {
    let (engine, store) = test_engine(Duration::from_secs(900));

    // Hand-craft a session whose claims have already lapsed but whose
    // record is still present in the store.
    let mut record = SessionRecord::new(
        AuthId("u1".to_string()),
        "admin".to_string(),
        "default".to_string(),
        "hash".to_string(),
        Duration::from_secs(900),
    );
    record.created_at = Utc::now().trunc_subsecs(0) - ChronoDuration::seconds(1800);
    record.expires_at = record.created_at + ChronoDuration::seconds(900);
    store.put(&record).await.unwrap();

    let bearer = engine.codec().encode(&record).unwrap();
    assert!(matches!(
        engine.validate(&bearer).await,
        Err(AuthError::Expired)
    ));
}

#[tokio::test]
async fn revoked_session_fails_validation() {
    let (engine, _) = test_engine(Duration::from_secs(900));

    let response = engine
        .create(&TokenInput::new("u1", "admin"))
        .await
        .unwrap();
    let record = engine.validate(&response.access_token).await.unwrap();

    assert!(engine.revoke(&record.session_id).await.unwrap());
    assert!(matches!(
        engine.validate(&response.access_token).await,
        Err(AuthError::Revoked)
    ));

    // Second revoke of the same session reports nothing removed.
    assert!(!engine.revoke(&record.session_id).await.unwrap());
}

#[tokio::test]
async fn revoke_all_kills_every_session() {
    let (engine, store) = test_engine(Duration::from_secs(900));
    let auth_id = AuthId("u1".to_string());

    let phone = engine
        .create(&TokenInput::new("u1", "admin").with_session_secret("phone"))
        .await
        .unwrap();
    let laptop = engine
        .create(&TokenInput::new("u1", "admin").with_session_secret("laptop"))
        .await
        .unwrap();

    assert_eq!(store.list_by_auth_id(&auth_id).await.unwrap().len(), 2);

    let count = engine.revoke_all(&auth_id).await.unwrap();
    assert_eq!(count, 2);

    assert!(store.list_by_auth_id(&auth_id).await.unwrap().is_empty());
    assert!(matches!(
        engine.validate(&phone.access_token).await,
        Err(AuthError::Revoked)
    ));
    assert!(matches!(
        engine.validate(&laptop.access_token).await,
        Err(AuthError::Revoked)
    ));
}

#[tokio::test]
async fn refresh_rotates_and_invalidates_old_bearer() {
    let (engine, _) = test_engine(Duration::from_secs(900));

    let first = engine
        .create(&TokenInput::new("u1", "admin"))
        .await
        .unwrap();
    let first_record = engine.validate(&first.access_token).await.unwrap();

    // Timestamps are second-granular; cross the boundary so the rotated
    // expiry is strictly later.
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let second = engine
        .refresh(&first.refresh_key, &first.access_token)
        .await
        .unwrap();
    let second_record = engine.validate(&second.access_token).await.unwrap();

    assert_ne!(second_record.session_id, first_record.session_id);
    assert_eq!(second_record.auth_id, first_record.auth_id);
    assert_eq!(second_record.role, first_record.role);
    assert!(second.expires_at > first.expires_at);

    // Immediate invalidation policy: the superseded bearer is dead.
    assert!(matches!(
        engine.validate(&first.access_token).await,
        Err(AuthError::Revoked)
    ));
}

#[tokio::test]
async fn refresh_rejects_superseded_bearer_with_rotated_secret() {
    let (engine, _) = test_engine(Duration::from_secs(900));

    let first = engine
        .create(&TokenInput::new("u1", "admin"))
        .await
        .unwrap();
    let second = engine
        .refresh(&first.refresh_key, &first.access_token)
        .await
        .unwrap();

    // The rotated secret was never issued alongside the old bearer, so
    // the pairing must not mint another token.
    let err = engine
        .refresh(&second.refresh_key, &first.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RefreshMismatch));

    // The old secret with the old bearer is equally dead.
    assert!(matches!(
        engine
            .refresh(&first.refresh_key, &first.access_token)
            .await,
        Err(AuthError::RefreshMismatch)
    ));

    // The live pairing still rotates.
    assert!(engine
        .refresh(&second.refresh_key, &second.access_token)
        .await
        .is_ok());
}

#[tokio::test]
async fn expiry_boundary_reports_expired_not_revoked() {
    let (engine, store) = test_engine(Duration::from_secs(900));

    // A session lapsing in the current second: the JWT exp check alone
    // still passes while the store entry is already gone (or about to be),
    // and the lapsed claims must win over the store lookup.
    let mut record = SessionRecord::new(
        AuthId("u1".to_string()),
        "admin".to_string(),
        "default".to_string(),
        "hash".to_string(),
        Duration::from_secs(900),
    );
    let now = Utc::now().trunc_subsecs(0);
    record.created_at = now - ChronoDuration::seconds(900);
    record.expires_at = now;
    store.put(&record).await.unwrap();

    let bearer = engine.codec().encode(&record).unwrap();
    assert!(matches!(
        engine.validate(&bearer).await,
        Err(AuthError::Expired)
    ));
}

#[tokio::test]
async fn refresh_rejects_wrong_secret() {
    let (engine, _) = test_engine(Duration::from_secs(900));

    let response = engine
        .create(&TokenInput::new("u1", "admin"))
        .await
        .unwrap();

    let err = engine
        .refresh("definitely-not-the-secret", &response.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RefreshMismatch));

    // The bearer itself is untouched by the failed attempt.
    assert!(engine.validate(&response.access_token).await.is_ok());
}

#[tokio::test]
async fn refresh_works_on_expired_bearer() {
    let (engine, _) = test_engine(Duration::from_secs(1));

    let response = engine
        .create(&TokenInput::new("u1", "admin"))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(matches!(
        engine.validate(&response.access_token).await,
        Err(AuthError::Expired)
    ));

    let rotated = engine
        .refresh(&response.refresh_key, &response.access_token)
        .await
        .unwrap();
    let record = engine.validate(&rotated.access_token).await.unwrap();
    assert_eq!(record.auth_id, AuthId("u1".to_string()));
}

#[tokio::test]
async fn refresh_after_revoke_all_is_revoked() {
    let (engine, _) = test_engine(Duration::from_secs(900));

    let response = engine
        .create(&TokenInput::new("u1", "admin"))
        .await
        .unwrap();
    engine.revoke_all(&AuthId("u1".to_string())).await.unwrap();

    assert!(matches!(
        engine
            .refresh(&response.refresh_key, &response.access_token)
            .await,
        Err(AuthError::Revoked)
    ));
}

#[tokio::test]
async fn reconcile_repairs_index_drift() {
    let (engine, store) = test_engine(Duration::from_secs(900));
    let auth_id = AuthId("u1".to_string());

    let phone = engine
        .create(&TokenInput::new("u1", "admin").with_session_secret("phone"))
        .await
        .unwrap();
    engine
        .create(&TokenInput::new("u1", "admin").with_session_secret("laptop"))
        .await
        .unwrap();

    // Single-session revoke leaves the principal-hash field behind.
    let record = engine.validate(&phone.access_token).await.unwrap();
    engine.revoke(&record.session_id).await.unwrap();
    assert_eq!(store.list_by_auth_id(&auth_id).await.unwrap().len(), 2);

    assert_eq!(engine.reconcile(&auth_id).await.unwrap(), 1);
    let remaining = store.list_by_auth_id(&auth_id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].session_secret, "laptop");

    // Idempotent once the drift is gone.
    assert_eq!(engine.reconcile(&auth_id).await.unwrap(), 0);
}

/// Store stub that reports the backend as unreachable.
struct DownStore;

#[async_trait]
impl SessionStore for DownStore {
    async fn put(&self, _: &SessionRecord) -> Result<(), AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".into()))
    }
    async fn get_by_session_id(&self, _: &SessionId) -> Result<Option<SessionRecord>, AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".into()))
    }
    async fn get_by_auth_id_field(
        &self,
        _: &AuthId,
        _: &str,
    ) -> Result<Option<SessionRecord>, AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".into()))
    }
    async fn list_by_auth_id(&self, _: &AuthId) -> Result<Vec<SessionRecord>, AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".into()))
    }
    async fn delete_by_session_id(&self, _: &SessionId) -> Result<bool, AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".into()))
    }
    async fn delete_auth_id_entry(&self, _: &AuthId) -> Result<bool, AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".into()))
    }
    async fn delete_many_by_session_id(&self, _: &[SessionId]) -> Result<u64, AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".into()))
    }
    async fn delete_auth_id_fields(&self, _: &AuthId, _: &[String]) -> Result<u64, AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn store_outage_is_not_an_authentication_fault() {
    let engine = TokenEngine::new(&test_config(Duration::from_secs(900)), Arc::new(DownStore));

    let err = engine
        .create(&TokenInput::new("u1", "admin"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::StoreUnavailable(_)));
    assert!(!err.is_authentication_fault());
}
