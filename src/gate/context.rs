//! Request-scoped identity context injected by the gate.
//!
//! One explicit struct instead of loose context-value entries: downstream
//! handlers pull [`AuthContext`] out of request extensions and get the
//! resolved identity, request metadata and a pre-tagged span in one place.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use tracing::Span;

/// Request metadata bundle resolved at authentication time.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Authenticated principal.
    pub auth_id: String,
    /// Resolved client address; empty when nothing parseable was found.
    pub ipv4: String,
    /// `X-Device-Id` header, verbatim.
    pub device_id: String,
    /// `X-Api-Version` header, verbatim.
    pub version: String,
    /// `X-Tracking-Id` header, verbatim.
    pub tracking_id: String,
    /// Time the gate admitted the request.
    pub request_time: DateTime<Utc>,
}

impl RequestMeta {
    /// Resolve metadata from inbound headers and the socket peer address.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, peer: Option<IpAddr>) -> Self {
        RequestMeta {
            auth_id: String::new(),
            ipv4: client_ip(headers, peer),
            device_id: header_value(headers, "x-device-id"),
            version: header_value(headers, "x-api-version"),
            tracking_id: header_value(headers, "x-tracking-id"),
            request_time: Utc::now(),
        }
    }
}

/// Identity published to downstream handlers after a successful gate pass.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated principal.
    pub auth_id: String,
    /// Role the session was issued with.
    pub role: String,
    /// Request metadata bundle.
    pub meta: RequestMeta,
    /// Span pre-tagged with the resolved identity; enter it to correlate
    /// downstream logs with the authenticated request.
    pub span: Span,
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Client address resolution, in documented precedence order: the explicit
/// `X-Real-IP` header if it parses, then the first parseable entry of
/// `X-Forwarded-For`, then the raw peer address.
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let candidate = real_ip.trim();
        if candidate.parse::<IpAddr>().is_ok() {
            return candidate.to_string();
        }
    }

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        for candidate in forwarded.split(',') {
            let candidate = candidate.trim();
            if candidate.parse::<IpAddr>().is_ok() {
                return candidate.to_string();
            }
        }
    }

    peer.map(|ip| ip.to_string()).unwrap_or_default()
}
