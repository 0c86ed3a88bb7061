//! Bearer credential codec: HS256-signed claims wrapped in an
//! AES-256-GCM encryption pass.
//!
//! The inner JWT provides integrity; the outer encryption makes the
//! credential opaque to holders without the encryption key. The wire form
//! is `base64url(nonce || ciphertext)` with a random 12-byte nonce.

use crate::error::AuthError;
use crate::session::SessionRecord;
use crate::token::claims::SessionClaims;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;

const NONCE_LEN: usize = 12;

/// Encodes session records into bearer credentials and back.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cipher: Aes256Gcm,
}

impl TokenCodec {
    /// Build a codec from the HS256 signing key and the 32-byte AES key.
    #[must_use]
    pub fn new(jwt_key: &[u8], enc_key: &[u8; 32]) -> Self {
        TokenCodec {
            encoding_key: EncodingKey::from_secret(jwt_key),
            decoding_key: DecodingKey::from_secret(jwt_key),
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(enc_key)),
        }
    }

    /// Encode a record into an opaque bearer credential.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Encoding` on JWT or cipher failure; both are
    /// setup faults (bad key material), not per-request conditions.
    pub fn encode(&self, record: &SessionRecord) -> Result<String, AuthError> {
        let claims = SessionClaims::from_record(record);
        let jwt = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, jwt.as_bytes())
            .map_err(|e| AuthError::Encoding(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    /// Decode and fully validate a bearer credential.
    ///
    /// # Errors
    ///
    /// `Malformed` when the string cannot be decrypted or parsed,
    /// `SignatureInvalid` when the inner signature fails, `Expired` when
    /// the claims are past their validity window.
    pub fn decode(&self, bearer: &str) -> Result<SessionClaims, AuthError> {
        let jwt = self.decrypt(bearer)?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(&jwt, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Decode for claims extraction only: the signature is still verified,
    /// expiry is not. Used by refresh, which explicitly accepts
    /// expired-but-not-revoked credentials.
    ///
    /// # Errors
    ///
    /// `Malformed` or `SignatureInvalid` as for [`Self::decode`].
    pub fn decode_expired(&self, bearer: &str) -> Result<SessionClaims, AuthError> {
        let jwt = self.decrypt(bearer)?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;

        let data = decode::<SessionClaims>(&jwt, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    fn decrypt(&self, bearer: &str) -> Result<String, AuthError> {
        let raw = URL_SAFE_NO_PAD
            .decode(bearer)
            .map_err(|_| AuthError::Malformed)?;
        if raw.len() <= NONCE_LEN {
            return Err(AuthError::Malformed);
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| AuthError::Malformed)?;

        String::from_utf8(plaintext).map_err(|_| AuthError::Malformed)
    }
}
