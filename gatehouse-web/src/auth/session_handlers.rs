//! Session authentication handlers backed by a server-side session cookie

use super::{users::LoginRequest, AuthError};
use crate::AppState;
use axum::{extract::State, response::Json, Json as JsonExtractor};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use gatehouse_core::UserSummary;
use serde_json::{json, Value};
use tracing::info;

fn session_cookie(name: String, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Session login: sets the session cookie on success
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonExtractor(request): JsonExtractor<LoginRequest>,
) -> Result<(CookieJar, Json<UserSummary>), AuthError> {
    let (session_id, account) = state
        .sessions
        .login(state.verifier.as_ref(), &request.username, &request.password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let cookie = session_cookie(state.config.auth.session_cookie.clone(), session_id);
    Ok((jar.add(cookie), Json(account.summary())))
}

/// Invalidate the session and expire its cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let name = state.config.auth.session_cookie.clone();
    if let Some(cookie) = jar.get(&name) {
        if state.sessions.logout(cookie.value()) {
            info!("Session logged out");
        }
    }

    let jar = jar.remove(Cookie::build((name, "")).path("/"));
    (
        jar,
        Json(json!({
            "message": "Logged out successfully",
        })),
    )
}

/// Account behind the session cookie
pub async fn me(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<UserSummary>, AuthError> {
    let session_id = jar
        .get(&state.config.auth.session_cookie)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AuthError::Unauthenticated)?;

    state
        .sessions
        .current_user(&session_id)
        .await?
        .map(|account| Json(account.summary()))
        .ok_or(AuthError::Unauthenticated)
}
