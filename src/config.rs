//! Centralized configuration for the token lifecycle.
//!
//! Constructed once at composition time and injected into the engine and
//! gate; there is no process-global client. Loaded from environment
//! variables via [`AuthConfig::from_env`] or built explicitly, and
//! validated before any request is served.

use crate::error::AuthError;
use std::env;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Sentinel hash-map field used when the caller supplies no session secret.
pub const DEFAULT_SESSION_SECRET: &str = "default";

/// Token lifecycle configuration.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AuthConfig {
    /// HMAC key for JWT signing (HS256).
    pub jwt_key: Vec<u8>,
    /// AES-256-GCM key for the confidentiality pass over the signed token.
    pub enc_key: [u8; 32],
    /// Validity window applied to every issued session.
    #[zeroize(skip)]
    pub validity: Duration,
    /// Redis connection URL, consumed by [`crate::RedisSessionStore`].
    #[zeroize(skip)]
    pub redis_url: String,
    /// Upper bound on any single store operation before it is reported as
    /// unavailable.
    #[zeroize(skip)]
    pub store_op_timeout: Duration,
}

impl AuthConfig {
    /// Build a configuration from explicit key material.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if the signing key is empty or the
    /// validity window is zero.
    pub fn new(
        jwt_key: impl Into<Vec<u8>>,
        enc_key: [u8; 32],
        validity: Duration,
    ) -> Result<Self, AuthError> {
        let cfg = Self {
            jwt_key: jwt_key.into(),
            enc_key,
            validity,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store_op_timeout: Duration::from_secs(2),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Set the Redis connection URL.
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Set the per-operation store timeout.
    #[must_use]
    pub fn with_store_op_timeout(mut self, timeout: Duration) -> Self {
        self.store_op_timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required: `JWT_SIGNING_KEY`, `TOKEN_ENC_KEY` (base64, 32 bytes).
    /// Optional: `TOKEN_VALIDITY_MINS` (default 60), `REDIS_URL`,
    /// `STORE_OP_TIMEOUT_MS` (default 2000).
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let jwt_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| AuthError::Config("JWT_SIGNING_KEY is required".to_string()))?
            .into_bytes();
        let enc_key = parse_enc_key()?;
        let validity = Duration::from_secs(parse_env("TOKEN_VALIDITY_MINS", 60u64)? * 60);
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let store_op_timeout = Duration::from_millis(parse_env("STORE_OP_TIMEOUT_MS", 2000)?);

        let cfg = Self {
            jwt_key,
            enc_key,
            validity,
            redis_url,
            store_op_timeout,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_key.is_empty() {
            return Err(AuthError::Config("JWT signing key must not be empty".to_string()));
        }
        if self.validity.is_zero() {
            return Err(AuthError::Config("validity window must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_key", &"<redacted>")
            .field("enc_key", &"<redacted>")
            .field("validity", &self.validity)
            .field("redis_url", &self.redis_url)
            .field("store_op_timeout", &self.store_op_timeout)
            .finish()
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AuthError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| AuthError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

/// Parse the 32-byte AES key from `TOKEN_ENC_KEY`.
fn parse_enc_key() -> Result<[u8; 32], AuthError> {
    let key = env::var("TOKEN_ENC_KEY")
        .map_err(|_| AuthError::Config("TOKEN_ENC_KEY is required".to_string()))?;

    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &key)
        .map_err(|e| AuthError::Config(format!("Invalid TOKEN_ENC_KEY: {}", e)))?;

    if bytes.len() != 32 {
        return Err(AuthError::Config(format!(
            "TOKEN_ENC_KEY must be 32 bytes, got {}",
            bytes.len()
        )));
    }

    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}
