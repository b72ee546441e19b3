//! Client identification and the generic API rate limit
//!
//! Each request is charged against a bucket keyed by the client address. The
//! address comes from proxy headers when present, otherwise from the socket.

use crate::{auth::AuthError, AppState};
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use gatehouse_applications::PolicyKind;
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::debug;

/// Paths with their own limits, skipped by the generic API limit
const EXCLUDED_PREFIX: &str = "/api/v2/auth";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Derive the rate-limit key for a request
///
/// `X-Forwarded-For` (first entry), then `X-Real-IP`, then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = header_value(headers, "x-forwarded-for") {
        if let Some(first) = forwarded
            .split(',')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return first.to_string();
        }
    }

    if let Some(real_ip) = header_value(headers, "x-real-ip") {
        return real_ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Client key of the current request
#[derive(Debug, Clone)]
pub struct ClientAddr(pub String);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientAddr(client_key(&parts.headers, peer)))
    }
}

fn is_limited_path(path: &str) -> bool {
    path.starts_with("/api/") && !path.starts_with(EXCLUDED_PREFIX)
}

/// Generic API rate limit; rejects before any authentication work
pub async fn api_rate_limit(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if !is_limited_path(&path) {
        return next.run(request).await;
    }

    if !state.rate_limiter.try_consume(PolicyKind::Api, &client) {
        debug!(path = %path, client = %client, "API rate limit rejected request");
        return AuthError::RateLimited.into_response();
    }

    next.run(request).await
}
