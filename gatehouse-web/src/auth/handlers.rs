//! Token authentication handlers: login, refresh, logout and current user

use super::{
    jwt::TokenPair,
    users::{LoginRequest, RefreshRequest},
    AuthError, CurrentIdentity,
};
use crate::{security::ClientAddr, AppState};
use axum::{extract::State, response::Json, Json as JsonExtractor};
use gatehouse_applications::PolicyKind;
use gatehouse_core::UserSummary;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Login response: token pair plus the caller's public fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserSummary,
}

/// Refresh response: a new access token only
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Token login
///
/// Charged against the `login` rate limit before credentials are checked.
pub async fn login(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    JsonExtractor(request): JsonExtractor<LoginRequest>,
) -> Result<Json<TokenLoginResponse>, AuthError> {
    if !state.rate_limiter.try_consume(PolicyKind::Login, &client) {
        return Err(AuthError::RateLimited);
    }

    info!("Token login attempt: {}", request.username);

    let account = state
        .verifier
        .verify(&request.username, &request.password)
        .await?
        .ok_or_else(|| {
            warn!(username = %request.username, client = %client, "Token login rejected");
            AuthError::InvalidCredentials
        })?;

    if !account.status.is_active() {
        warn!(username = %account.username, status = %account.status, "Login for inactive account");
        return Err(AuthError::AccountNotActive);
    }

    state.directory.record_login(&account.username).await?;
    let tokens = state.tokens.issue_pair(&account.identity())?;

    info!("User logged in successfully: {}", account.username);
    Ok(Json(TokenLoginResponse {
        tokens,
        user: account.summary(),
    }))
}

/// Exchange a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    JsonExtractor(request): JsonExtractor<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AuthError> {
    let token = request
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or(AuthError::MissingRefreshToken)?;

    let subject = state.tokens.parse_subject(&token)?;
    if !state.tokens.is_refresh_kind(&token) {
        warn!(subject = %subject, "Access token presented for refresh");
        return Err(AuthError::TokenWrongKind);
    }

    // Unknown and inactive subjects answer exactly like a bad token
    let account = state
        .directory
        .find_by_username(&subject)
        .await?
        .ok_or_else(|| {
            warn!(subject = %subject, "Refresh for unknown subject");
            AuthError::TokenMalformed
        })?;
    let identity = account.identity();

    state.tokens.check(&token, &identity).map_err(|e| match e {
        AuthError::AccountNotActive => {
            warn!(subject = %subject, "Refresh for inactive account");
            AuthError::TokenMalformed
        }
        other => other,
    })?;

    let access_token = state.tokens.issue_access_token(&identity)?;
    info!("Token refreshed successfully for {}", subject);

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.tokens.access_expires_in(),
    }))
}

/// Logout acknowledgment
///
/// Tokens stay valid until they expire; clients are expected to discard them.
pub async fn logout(CurrentIdentity(identity): CurrentIdentity) -> Json<Value> {
    info!("User logout: {}", identity.subject);

    Json(json!({
        "message": "Logged out successfully",
    }))
}

/// Public fields of the authenticated caller
pub async fn me(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<UserSummary>, AuthError> {
    let account = state
        .directory
        .find_by_username(&identity.subject)
        .await?
        .ok_or(AuthError::IdentityNotFound)?;

    Ok(Json(account.summary()))
}
