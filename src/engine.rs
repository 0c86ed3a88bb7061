//! Token lifecycle engine.
//!
//! Orchestrates issuance, validation, refresh rotation and revocation over
//! the codec and the store adaptor. Per session the states run
//! `Issued → Valid → {Expired, Revoked, Superseded}`; expired and revoked
//! both surface as an absent point entry, superseded only through refresh.

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::metrics;
use crate::session::{AuthId, SessionId, SessionRecord, TokenInput};
use crate::storage::SessionStore;
use crate::token::{RefreshSecret, TokenCodec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Issuance output contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Opaque bearer credential.
    pub access_token: String,
    /// Companion refresh secret, shown to the caller exactly once.
    pub refresh_key: String,
    /// Expiry as unix seconds.
    pub expires_at: i64,
}

/// Issues, validates, rotates and revokes session credentials.
pub struct TokenEngine {
    store: Arc<dyn SessionStore>,
    codec: TokenCodec,
    validity: Duration,
}

impl TokenEngine {
    /// Build an engine from configuration and a store adaptor.
    #[must_use]
    pub fn new(config: &AuthConfig, store: Arc<dyn SessionStore>) -> Self {
        TokenEngine {
            store,
            codec: TokenCodec::new(&config.jwt_key, &config.enc_key),
            validity: config.validity,
        }
    }

    /// The codec in use; handy for embedding apps that need raw decode.
    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Issue a new session for an authenticated principal.
    ///
    /// # Errors
    ///
    /// `Validation` on bad input; `StoreUnavailable` or `Encoding` as the
    /// collaborators dictate.
    pub async fn create(&self, input: &TokenInput) -> Result<TokenResponse, AuthError> {
        input.validate()?;

        let response = self
            .issue(
                AuthId(input.auth_id.clone()),
                input.role.clone(),
                input.session_secret_or_default(),
            )
            .await?;

        metrics::record_token_issued(&input.role);
        Ok(response)
    }

    /// Validate a bearer credential and return its live session record.
    ///
    /// Decoding alone is not enough: a well-formed, unexpired credential
    /// whose point entry is gone was revoked server-side and is reported
    /// as `Revoked`.
    ///
    /// # Errors
    ///
    /// `Malformed`/`SignatureInvalid`/`Expired` from the codec, `Revoked`
    /// for decoded-but-absent sessions, `StoreUnavailable` from the store.
    pub async fn validate(&self, bearer: &str) -> Result<SessionRecord, AuthError> {
        let result = self.validate_inner(bearer).await;
        match &result {
            Ok(_) => metrics::record_validation("ok"),
            Err(e) => metrics::record_validation(e.code()),
        }
        result
    }

    async fn validate_inner(&self, bearer: &str) -> Result<SessionRecord, AuthError> {
        let claims = self.codec.decode(bearer)?;
        // The JWT expiry check is exclusive while the store entry dies at
        // exactly `exp`; during that boundary second the lapsed claims must
        // win over the (possibly already absent) store lookup.
        if claims.is_expired() {
            return Err(AuthError::Expired);
        }
        let session_id = claims.session_id();

        self.store
            .get_by_session_id(&session_id)
            .await?
            .ok_or(AuthError::Revoked)
    }

    /// Rotate a session: mint a replacement credential for the same
    /// principal and role.
    ///
    /// The presented bearer only needs to carry a valid signature — its
    /// expiry may have lapsed. The caller must also present the refresh
    /// secret bound at issuance; the comparison is constant-time against
    /// the stored hash. The superseded session's point entry is deleted
    /// immediately so a leaked old bearer stops validating at rotation.
    ///
    /// # Errors
    ///
    /// `RefreshMismatch` when the secret does not match, `Revoked` when
    /// the session is gone from the principal index, codec and store
    /// errors otherwise.
    pub async fn refresh(
        &self,
        refresh_key: &str,
        bearer: &str,
    ) -> Result<TokenResponse, AuthError> {
        let result = self.refresh_inner(refresh_key, bearer).await;
        match &result {
            Ok(_) => metrics::record_token_refreshed("ok"),
            Err(e) => metrics::record_token_refreshed(e.code()),
        }
        result
    }

    async fn refresh_inner(
        &self,
        refresh_key: &str,
        bearer: &str,
    ) -> Result<TokenResponse, AuthError> {
        let claims = self.codec.decode_expired(bearer)?;
        let auth_id = claims.auth_id();

        let stored = self
            .store
            .get_by_auth_id_field(&auth_id, &claims.skey)
            .await?
            .ok_or(AuthError::Revoked)?;

        // The hash field holds the latest record for this secret slot.
        // After a rotation that is the successor session, whose refresh
        // secret was never issued alongside the presented bearer.
        if stored.session_id != claims.session_id() {
            warn!(auth_id = %auth_id, "Refresh presented against a superseded credential");
            return Err(AuthError::RefreshMismatch);
        }

        if !RefreshSecret::matches(refresh_key, &stored.refresh_hash) {
            warn!(auth_id = %auth_id, "Refresh secret mismatch");
            return Err(AuthError::RefreshMismatch);
        }

        let old_session_id = stored.session_id.clone();
        let response = self
            .issue(stored.auth_id, stored.role, stored.session_secret)
            .await?;

        // Immediate invalidation of the superseded entry. If this delete
        // fails the entry still dies by its own TTL.
        if let Err(e) = self.store.delete_by_session_id(&old_session_id).await {
            warn!(
                session_id = %old_session_id,
                error = %e,
                "Failed to delete superseded session entry"
            );
        }

        info!(
            auth_id = %auth_id,
            old_session_id = %old_session_id,
            "Rotated session credential"
        );
        Ok(response)
    }

    /// Revoke a single session by deleting its point entry.
    ///
    /// The per-principal hash field is intentionally left in place, as the
    /// original behavior does; it is reaped by [`Self::revoke_all`] or
    /// [`Self::reconcile`].
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` only; an unknown ID is `Ok(false)`.
    pub async fn revoke(&self, session_id: &SessionId) -> Result<bool, AuthError> {
        let removed = self.store.delete_by_session_id(session_id).await?;
        if removed {
            metrics::record_token_revoked("single");
            info!(session_id = %session_id, "Revoked session");
        }
        Ok(removed)
    }

    /// Revoke every session of a principal ("log out everywhere").
    ///
    /// Ordering matters: enumerate, bulk-delete the point entries, then
    /// drop the principal hash, so no orphaned point entries survive the
    /// hash.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` from any step.
    pub async fn revoke_all(&self, auth_id: &AuthId) -> Result<u64, AuthError> {
        let records = self.store.list_by_auth_id(auth_id).await?;
        let ids: Vec<SessionId> = records.into_iter().map(|r| r.session_id).collect();

        let removed = self.store.delete_many_by_session_id(&ids).await?;
        self.store.delete_auth_id_entry(auth_id).await?;

        metrics::record_token_revoked("all");
        info!(auth_id = %auth_id, count = removed, "Revoked all sessions for principal");
        Ok(removed)
    }

    /// Housekeeping: drop principal-hash fields whose point entry no
    /// longer exists (single-session revocations, lapsed TTLs). Never runs
    /// on the request path; returns the number of fields repaired.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` from any step.
    pub async fn reconcile(&self, auth_id: &AuthId) -> Result<u64, AuthError> {
        let records = self.store.list_by_auth_id(auth_id).await?;

        let mut stale = Vec::new();
        for record in records {
            if self
                .store
                .get_by_session_id(&record.session_id)
                .await?
                .is_none()
            {
                stale.push(record.session_secret);
            }
        }

        if stale.is_empty() {
            return Ok(0);
        }
        let repaired = self.store.delete_auth_id_fields(auth_id, &stale).await?;
        info!(auth_id = %auth_id, repaired, "Reconciled principal session index");
        Ok(repaired)
    }

    async fn issue(
        &self,
        auth_id: AuthId,
        role: String,
        session_secret: String,
    ) -> Result<TokenResponse, AuthError> {
        let refresh_key = RefreshSecret::generate();
        let record = SessionRecord::new(
            auth_id,
            role,
            session_secret,
            RefreshSecret::hash(&refresh_key),
            self.validity,
        );

        self.store.put(&record).await?;
        let access_token = self.codec.encode(&record)?;

        info!(
            auth_id = %record.auth_id,
            session_id = %record.session_id,
            "Issued session credential"
        );

        Ok(TokenResponse {
            access_token,
            refresh_key,
            expires_at: record.expires_at.timestamp(),
        })
    }
}
