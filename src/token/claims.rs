//! JWT claims carried inside a bearer credential.

use crate::session::{AuthId, SessionId, SessionRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed claims for one session. Field names follow JWT convention where
/// one exists (`sub`, `iat`, `exp`); the rest are compact custom claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Principal identifier.
    pub sub: String,
    /// Session identifier.
    pub sid: String,
    /// Authorization role.
    pub role: String,
    /// Session secret (hash-map field name on the principal index).
    pub skey: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

impl SessionClaims {
    /// Claims for a record; timestamps collapse to unix seconds.
    #[must_use]
    pub fn from_record(record: &SessionRecord) -> Self {
        SessionClaims {
            sub: record.auth_id.0.clone(),
            sid: record.session_id.0.clone(),
            role: record.role.clone(),
            skey: record.session_secret.clone(),
            iat: record.created_at.timestamp(),
            exp: record.expires_at.timestamp(),
        }
    }

    /// Principal identifier as a typed ID.
    #[must_use]
    pub fn auth_id(&self) -> AuthId {
        AuthId(self.sub.clone())
    }

    /// Session identifier as a typed ID.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        SessionId(self.sid.clone())
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// Issued-at as a timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    /// Whether the claims are past their validity window. The boundary
    /// second counts as expired, matching the instant the store entry's
    /// TTL elapses.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}
