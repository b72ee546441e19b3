//! Security Context
//!
//! Per-request holder of the resolved caller identity. Lives in the request's
//! extensions and is dropped with the request.

use gatehouse_core::{Identity, Role};
use serde::Serialize;

/// Which mechanism resolved the identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthSource {
    Session,
    Token,
}

impl std::fmt::Display for AuthSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthSource::Session => write!(f, "session"),
            AuthSource::Token => write!(f, "token"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    identity: Option<Identity>,
    source: Option<AuthSource>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity, source: AuthSource) -> Self {
        Self {
            identity: Some(identity),
            source: Some(source),
        }
    }

    /// Install an identity unless one is already present; returns whether it was installed
    pub fn install(&mut self, identity: Identity, source: AuthSource) -> bool {
        if self.identity.is_some() {
            return false;
        }
        self.identity = Some(identity);
        self.source = Some(source);
        true
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn source(&self) -> Option<AuthSource> {
        self.source
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.identity.as_ref().is_some_and(|i| i.role == role)
    }

    /// Granted authorities, e.g. `["ROLE_ADMIN"]`; empty when anonymous
    pub fn authorities(&self) -> Vec<String> {
        self.identity
            .as_ref()
            .map(Identity::authorities)
            .unwrap_or_default()
    }
}
