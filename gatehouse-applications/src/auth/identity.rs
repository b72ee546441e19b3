//! Authenticator capability
//!
//! Session and token authentication both implement [`Authenticator`] and both
//! produce a plain [`Identity`], so downstream code never cares which one ran.

use super::{AuthSource, SecurityContext};
use async_trait::async_trait;
use gatehouse_core::Identity;
use std::sync::Arc;
use tracing::debug;

/// Credentials lifted off a request by the transport layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCredentials {
    /// Session identifier from the session cookie
    pub session_id: Option<String>,
    /// Raw bearer token from the `Authorization` header
    pub bearer: Option<String>,
}

impl RequestCredentials {
    pub fn new(session_id: Option<String>, bearer: Option<String>) -> Self {
        Self { session_id, bearer }
    }

    /// Token part of an `Authorization: Bearer <token>` header value
    pub fn parse_bearer(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.session_id.is_none() && self.bearer.is_none()
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    fn source(&self) -> AuthSource;

    /// Resolve an identity from the credentials.
    ///
    /// Never fails: anything short of a fully verified identity is `None`.
    async fn authenticate(&self, credentials: &RequestCredentials) -> Option<Identity>;

    /// Run against a context, skipping when an identity is already installed
    async fn apply(&self, credentials: &RequestCredentials, ctx: &mut SecurityContext) {
        if ctx.is_authenticated() {
            return;
        }
        if let Some(identity) = self.authenticate(credentials).await {
            debug!(subject = %identity.subject, source = %self.source(), "Identity resolved");
            ctx.install(identity, self.source());
        }
    }
}

/// Authenticators tried in order; the first resolved identity wins
#[derive(Clone, Default)]
pub struct AuthChain {
    authenticators: Vec<Arc<dyn Authenticator>>,
}

impl AuthChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticators.push(authenticator);
        self
    }

    pub async fn resolve(&self, credentials: &RequestCredentials) -> SecurityContext {
        let mut ctx = SecurityContext::anonymous();
        if credentials.is_empty() {
            return ctx;
        }
        for authenticator in &self.authenticators {
            authenticator.apply(credentials, &mut ctx).await;
            if ctx.is_authenticated() {
                break;
            }
        }
        ctx
    }

    pub fn len(&self) -> usize {
        self.authenticators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authenticators.is_empty()
    }
}

impl std::fmt::Debug for AuthChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthChain")
            .field(
                "authenticators",
                &self
                    .authenticators
                    .iter()
                    .map(|a| a.source())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
