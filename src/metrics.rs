//! Prometheus metrics for the token lifecycle.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sessiongate_tokens_issued_total",
        "Total number of tokens issued",
        &["role"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Validation outcomes counter.
pub static TOKEN_VALIDATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sessiongate_token_validations_total",
        "Total number of bearer validations",
        &["status"]
    )
    .expect("Failed to register token_validations metric")
});

/// Tokens refreshed counter.
pub static TOKENS_REFRESHED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sessiongate_tokens_refreshed_total",
        "Total number of tokens refreshed",
        &["status"]
    )
    .expect("Failed to register tokens_refreshed metric")
});

/// Tokens revoked counter.
pub static TOKENS_REVOKED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sessiongate_tokens_revoked_total",
        "Total number of tokens revoked",
        &["scope"]
    )
    .expect("Failed to register tokens_revoked metric")
});

/// Record a token issuance.
pub fn record_token_issued(role: &str) {
    TOKENS_ISSUED.with_label_values(&[role]).inc();
}

/// Record a validation outcome (`ok` or an error code).
pub fn record_validation(status: &str) {
    TOKEN_VALIDATIONS.with_label_values(&[status]).inc();
}

/// Record a refresh outcome (`ok` or an error code).
pub fn record_token_refreshed(status: &str) {
    TOKENS_REFRESHED.with_label_values(&[status]).inc();
}

/// Record a revocation (`single` or `all`).
pub fn record_token_revoked(scope: &str) {
    TOKENS_REVOKED.with_label_values(&[scope]).inc();
}
