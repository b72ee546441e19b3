//! Gatehouse Applications - transport-independent security engines
//!
//! This crate holds everything that decides whether a request may proceed,
//! without knowing anything about HTTP:
//! - Token-bucket rate limiting keyed by client identity
//! - Server-side sessions and the session authenticator
//! - The per-request security context and the authorization gate

pub mod auth;
pub mod ratelimit;
pub mod session;

pub use auth::{
    AccessRule, AuthChain, AuthSource, Authenticator, AuthorizationGate, Decision, DenyReason,
    RequestCredentials, SecurityContext,
};
pub use ratelimit::{
    BucketStore, MaintenanceSweeper, PolicyKind, RateLimiter, RatePolicy, Sweep, SweeperHandle,
};
pub use session::{Session, SessionAuthenticator, SessionStore};

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Core error: {0}")]
    Core(#[from] gatehouse_core::GatehouseError),

    #[error("Invalid rate limit policy: {message}")]
    InvalidPolicy { message: String },
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

impl ApplicationError {
    /// Create an invalid policy error
    pub fn invalid_policy<S: Into<String>>(message: S) -> Self {
        Self::InvalidPolicy {
            message: message.into(),
        }
    }
}
