//! Authentication gate for axum routers.
//!
//! The only component that knows the HTTP-status mapping and response body
//! shape. All authentication faults come back as 401 with a distinct
//! machine-readable code; role mismatch shares the status class with its
//! own code; store and encoding faults are 500.
//!
//! ```rust,ignore
//! let gate = Gate::new(engine, "admin,service");
//! let app = Router::new()
//!     .route("/protected", get(handler))
//!     .layer(middleware::from_fn_with_state(gate, authenticate));
//! ```

pub mod context;

use crate::engine::TokenEngine;
use crate::error;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info_span;

pub use context::{client_ip, AuthContext, RequestMeta};

/// Gate state: the engine plus the allow-set of roles for the wrapped
/// subtree, supplied as a comma-separated list.
#[derive(Clone)]
pub struct Gate {
    engine: Arc<TokenEngine>,
    roles: Arc<str>,
}

impl Gate {
    /// Build a gate admitting only the given roles.
    #[must_use]
    pub fn new(engine: Arc<TokenEngine>, roles: impl Into<String>) -> Self {
        Gate {
            engine,
            roles: roles.into().into(),
        }
    }

    fn allowed_roles(&self) -> HashSet<&str> {
        self.roles
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .collect()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
}

fn reject(status: StatusCode, code: &'static str) -> Response {
    (status, Json(ErrorBody { code })).into_response()
}

/// Middleware entrypoint for `axum::middleware::from_fn_with_state`.
pub async fn authenticate(State(gate): State<Gate>, mut request: Request, next: Next) -> Response {
    let bearer = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        // Accept both a bare credential and the `Bearer ` convention.
        Some(value) => value.strip_prefix("Bearer ").unwrap_or(value).trim(),
        None => return reject(StatusCode::UNAUTHORIZED, error::TOKEN_MALFORMED),
    };

    let record = match gate.engine.validate(bearer).await {
        Ok(record) => record,
        Err(e) if e.is_authentication_fault() => {
            return reject(StatusCode::UNAUTHORIZED, e.code());
        }
        Err(e) => return reject(StatusCode::INTERNAL_SERVER_ERROR, e.code()),
    };

    if !gate.allowed_roles().contains(record.role.as_str()) {
        return reject(StatusCode::UNAUTHORIZED, error::ROLE_MISMATCH);
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());
    let mut meta = RequestMeta::from_headers(request.headers(), peer);
    meta.auth_id = record.auth_id.0.clone();

    let span = info_span!(
        "authenticated_request",
        auth_id = %record.auth_id,
        role = %record.role,
        tracking_id = %meta.tracking_id,
    );

    request.extensions_mut().insert(AuthContext {
        auth_id: record.auth_id.0,
        role: record.role,
        meta,
        span,
    });

    next.run(request).await
}
