//! Error taxonomy for the token lifecycle.
//!
//! The codec and store adaptor only ever produce variants from this enum;
//! neither of them logs or knows about HTTP. The gate is the single place
//! where variants are mapped to statuses and response bodies.

use thiserror::Error;

/// Errors surfaced by the token lifecycle engine and its collaborators.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Bad caller input on issuance (empty, too long, or disallowed characters).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The bearer string could not be decrypted or parsed at all.
    #[error("Token malformed")]
    Malformed,

    /// The bearer decrypted to a JWT whose signature did not verify.
    #[error("Token signature invalid")]
    SignatureInvalid,

    /// Claims are past their validity window.
    #[error("Token expired")]
    Expired,

    /// The credential decoded cleanly but its session is gone from the store.
    #[error("Token revoked")]
    Revoked,

    /// Presented refresh secret does not match the one bound at issuance.
    #[error("Refresh key mismatch")]
    RefreshMismatch,

    /// Backend unreachable or timed out. Distinct from "not found".
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Cryptographic or serialization failure while encoding. A setup
    /// fault, not a per-request fault.
    #[error("Token encoding error: {0}")]
    Encoding(String),

    /// Invalid configuration (bad key material, zero validity window).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything else; serialization bugs mostly.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable code for response bodies and metrics labels.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => VALIDATION_FAILED,
            Self::Malformed => TOKEN_MALFORMED,
            Self::SignatureInvalid => TOKEN_SIGNATURE_INVALID,
            Self::Expired => TOKEN_EXPIRED,
            Self::Revoked => TOKEN_REVOKED,
            Self::RefreshMismatch => REFRESH_MISMATCH,
            Self::StoreUnavailable(_) => STORE_UNAVAILABLE,
            Self::Encoding(_) => TOKEN_ENCODING_ERROR,
            Self::Config(_) => CONFIG_ERROR,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }

    /// True for the variants the gate reports as unauthenticated rather
    /// than as a server fault.
    #[must_use]
    pub const fn is_authentication_fault(&self) -> bool {
        matches!(
            self,
            Self::Malformed
                | Self::SignatureInvalid
                | Self::Expired
                | Self::Revoked
                | Self::RefreshMismatch
        )
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
            _ => AuthError::Malformed,
        }
    }
}

// Error codes for response bodies
pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
pub const TOKEN_MALFORMED: &str = "TOKEN_MALFORMED";
pub const TOKEN_SIGNATURE_INVALID: &str = "TOKEN_SIGNATURE_INVALID";
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
pub const TOKEN_REVOKED: &str = "TOKEN_REVOKED";
pub const REFRESH_MISMATCH: &str = "REFRESH_MISMATCH";
pub const STORE_UNAVAILABLE: &str = "STORE_UNAVAILABLE";
pub const TOKEN_ENCODING_ERROR: &str = "TOKEN_ENCODING_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const ROLE_MISMATCH: &str = "ROLE_MISMATCH";
