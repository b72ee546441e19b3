//! Authentication and authorization for the HTTP surface

pub mod handlers;
pub mod jwt;
pub mod session_handlers;
pub mod users;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use gatehouse_applications::{ApplicationError, SecurityContext};
use gatehouse_core::{GatehouseError, Identity};
use serde_json::json;
use tracing::error;

/// Authentication and authorization failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Too many requests")]
    RateLimited,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account is not active")]
    AccountNotActive,
    #[error("Malformed token")]
    TokenMalformed,
    #[error("Token expired")]
    TokenExpired,
    #[error("Wrong token type")]
    TokenWrongKind,
    #[error("Identity not found")]
    IdentityNotFound,
    #[error("Missing refresh token")]
    MissingRefreshToken,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("Token creation failed")]
    TokenCreation,
    #[error("Password hashing failed")]
    PasswordHashing,
    #[error("User directory error: {0}")]
    Directory(#[from] GatehouseError),
}

impl From<ApplicationError> for AuthError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Core(core) => AuthError::Directory(core),
            other => AuthError::Directory(GatehouseError::Internal {
                message: other.to_string(),
                source: None,
                context: gatehouse_core::ErrorContext::new("auth"),
            }),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            AuthError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests, please try again later",
            ),
            AuthError::InvalidCredentials | AuthError::IdentityNotFound => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid username or password",
            ),
            AuthError::AccountNotActive => (
                StatusCode::FORBIDDEN,
                "account_not_active",
                "Account is disabled or pending activation",
            ),
            // One body for every token failure
            AuthError::TokenMalformed | AuthError::TokenExpired | AuthError::TokenWrongKind => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid or expired token",
            ),
            AuthError::MissingRefreshToken => (
                StatusCode::BAD_REQUEST,
                "missing_refresh_token",
                "Refresh token is required",
            ),
            AuthError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required",
            ),
            AuthError::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Insufficient permissions for this resource",
            ),
            AuthError::TokenCreation => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_creation_failed",
                "Failed to create authentication token",
            ),
            AuthError::PasswordHashing => {
                error!("Password hashing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
            AuthError::Directory(e) => {
                e.log();
                error!("User directory failure during authentication");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };

        let body = Json(json!({
            "error": error_code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Identity installed by the authentication middleware
///
/// Rejects with 401 when the request is anonymous.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(SecurityContext::identity)
            .cloned()
            .map(CurrentIdentity)
            .ok_or(AuthError::Unauthenticated)
    }
}
