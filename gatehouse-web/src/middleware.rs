//! Authentication and authorization middleware
//!
//! `authenticate` resolves the caller from the session cookie or bearer token
//! (bearer only under `/api/v2/`) and stores a `SecurityContext` in the request extensions. `authorize` then
//! checks the route table against that context.

use crate::{auth::AuthError, AppState};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use gatehouse_applications::{Decision, DenyReason, RequestCredentials, SecurityContext};
use tracing::debug;

/// Collect the raw credentials a request carries
pub fn request_credentials(headers: &HeaderMap, session_cookie: &str) -> RequestCredentials {
    let session_id = CookieJar::from_headers(headers)
        .get(session_cookie)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(RequestCredentials::parse_bearer)
        .map(str::to_string);

    RequestCredentials::new(session_id, bearer)
}

/// Resolve the caller; never rejects on its own
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let credentials = request_credentials(request.headers(), &state.config.auth.session_cookie);
    let chain = state.chain_for(request.uri().path());
    let context = chain.resolve(&credentials).await;

    if let (Some(identity), Some(source)) = (context.identity(), context.source()) {
        debug!(subject = %identity.subject, source = %source, "Request authenticated");
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Apply the route table to the resolved caller
pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let identity = request
        .extensions()
        .get::<SecurityContext>()
        .and_then(SecurityContext::identity);

    let decision = state.gate.authorize(identity, request.uri().path());

    match decision {
        Decision::Allow => next.run(request).await,
        Decision::Deny(DenyReason::Unauthenticated) => AuthError::Unauthenticated.into_response(),
        Decision::Deny(DenyReason::Forbidden) => AuthError::Forbidden.into_response(),
    }
}
