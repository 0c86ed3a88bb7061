//! Session record and issuance input contract.

use crate::config::DEFAULT_SESSION_SECRET;
use crate::error::AuthError;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum length of a principal identifier.
pub const MAX_AUTH_ID_LEN: usize = 100;
/// Maximum length of a role name.
pub const MAX_ROLE_LEN: usize = 20;
/// Maximum length of a caller-supplied session secret.
pub const MAX_SESSION_SECRET_LEN: usize = 100;

/// Opaque identifier of the authenticated subject. Stable across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthId(pub String);

/// Globally unique identifier of one issued session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl std::fmt::Display for AuthId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side source of truth for one issued credential.
///
/// Stored twice in the backend: under `session:<session_id>` with a TTL
/// equal to the validity window, and as the `session_secret` field of the
/// `principal:<auth_id>` hash, which carries no TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Generator-assigned unique session ID.
    pub session_id: SessionId,
    /// Principal the session was issued for.
    pub auth_id: AuthId,
    /// Authorization scope, immutable for the session's lifetime.
    pub role: String,
    /// Disambiguates concurrent sessions for the same principal.
    pub session_secret: String,
    /// SHA-256 of the refresh secret bound at issuance. The secret itself
    /// is never stored.
    pub refresh_hash: String,
    /// Issuance time, truncated to whole seconds to match JWT claims.
    pub created_at: DateTime<Utc>,
    /// Expiry time; always strictly after `created_at`.
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Build a fresh record with a generated session ID and second-granular
    /// timestamps.
    pub fn new(
        auth_id: AuthId,
        role: String,
        session_secret: String,
        refresh_hash: String,
        validity: Duration,
    ) -> Self {
        let created_at = Utc::now().trunc_subsecs(0);
        let expires_at =
            created_at + chrono::Duration::from_std(validity).unwrap_or_else(|_| chrono::Duration::zero());
        SessionRecord {
            session_id: SessionId(uuid::Uuid::new_v4().to_string()),
            auth_id,
            role,
            session_secret,
            refresh_hash,
            created_at,
            expires_at,
        }
    }

    /// Remaining validity as stored; drives the point-entry TTL.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        (self.expires_at - self.created_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Issuance input contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInput {
    /// Principal to issue for. Required, at most 100 characters.
    pub auth_id: String,
    /// Role granted to the session. Required, at most 20 characters.
    pub role: String,
    /// Optional session disambiguator, at most 100 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_secret: Option<String>,
}

impl TokenInput {
    /// Create an input with the default session secret.
    pub fn new(auth_id: impl Into<String>, role: impl Into<String>) -> Self {
        TokenInput {
            auth_id: auth_id.into(),
            role: role.into(),
            session_secret: None,
        }
    }

    /// Set an explicit session secret.
    #[must_use]
    pub fn with_session_secret(mut self, secret: impl Into<String>) -> Self {
        self.session_secret = Some(secret.into());
        self
    }

    /// Enforce the length and character-set constraints.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` naming the offending field.
    pub fn validate(&self) -> Result<(), AuthError> {
        validate_component("auth_id", &self.auth_id, MAX_AUTH_ID_LEN, true)?;
        validate_component("role", &self.role, MAX_ROLE_LEN, true)?;
        if let Some(secret) = &self.session_secret {
            validate_component("session_secret", secret, MAX_SESSION_SECRET_LEN, false)?;
        }
        Ok(())
    }

    /// Resolved session secret: the caller's value, or the sentinel.
    #[must_use]
    pub fn session_secret_or_default(&self) -> String {
        self.session_secret
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_SECRET.to_string())
    }
}

fn validate_component(
    field: &str,
    value: &str,
    max_len: usize,
    required: bool,
) -> Result<(), AuthError> {
    if value.is_empty() {
        if required {
            return Err(AuthError::Validation(format!("{} is required", field)));
        }
        return Ok(());
    }
    if value.len() > max_len {
        return Err(AuthError::Validation(format!(
            "{} exceeds {} characters",
            field, max_len
        )));
    }
    if !value.chars().all(is_allowed_char) {
        return Err(AuthError::Validation(format!(
            "{} contains disallowed characters",
            field
        )));
    }
    Ok(())
}

/// ASCII alphanumerics plus `- _ . @ :`. Covers UUIDs, emails and
/// namespaced roles while excluding whitespace and separator bytes.
fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | ':')
}
