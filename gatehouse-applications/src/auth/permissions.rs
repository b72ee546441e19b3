//! Authorization Gate
//!
//! A static, ordered table of path patterns and the access each requires.
//! The first matching rule decides; the gate holds no mutable state.

use gatehouse_core::{Identity, Role};
use tracing::debug;

/// Path pattern: an exact path, `<prefix>/**`, or `/**`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    /// Matches the prefix itself and every sub-path
    Prefix(String),
    Any,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        if pattern == "/**" {
            PathPattern::Any
        } else if let Some(prefix) = pattern.strip_suffix("/**") {
            PathPattern::Prefix(prefix.to_string())
        } else {
            PathPattern::Exact(pattern.to_string())
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            PathPattern::Any => true,
        }
    }
}

/// What a matching path requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AnyRole(Vec<Role>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity where one is required
    Unauthenticated,
    /// Identity present but its role is not allowed
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    pub patterns: Vec<PathPattern>,
    pub access: Access,
}

impl AccessRule {
    pub fn new(patterns: &[&str], access: Access) -> Self {
        Self {
            patterns: patterns.iter().map(|p| PathPattern::parse(p)).collect(),
            access,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    rules: Vec<AccessRule>,
}

impl AuthorizationGate {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// Route table of the admin API
    pub fn default_rules() -> Vec<AccessRule> {
        vec![
            AccessRule::new(&["/api/v2/auth/login", "/api/v2/auth/refresh"], Access::Public),
            AccessRule::new(&["/api/home", "/api/stats", "/api/health"], Access::Public),
            AccessRule::new(&["/api/auth/**"], Access::Public),
            AccessRule::new(&["/api/v2/auth/me", "/api/v2/auth/logout"], Access::Authenticated),
            AccessRule::new(&["/api/users/**"], Access::AnyRole(vec![Role::Admin, Role::Manager])),
            AccessRule::new(&["/api/roles/**"], Access::AnyRole(vec![Role::Admin])),
            AccessRule::new(&["/api/permissions/**"], Access::AnyRole(vec![Role::Admin])),
            AccessRule::new(&["/**"], Access::Authenticated),
        ]
    }

    pub fn authorize(&self, identity: Option<&Identity>, path: &str) -> Decision {
        let Some(rule) = self.rules.iter().find(|rule| rule.matches(path)) else {
            debug!(path, "No access rule matched, denying");
            return match identity {
                Some(_) => Decision::Deny(DenyReason::Forbidden),
                None => Decision::Deny(DenyReason::Unauthenticated),
            };
        };

        let decision = match (&rule.access, identity) {
            (Access::Public, _) => Decision::Allow,
            (_, None) => Decision::Deny(DenyReason::Unauthenticated),
            (Access::Authenticated, Some(_)) => Decision::Allow,
            (Access::AnyRole(roles), Some(identity)) => {
                if roles.contains(&identity.role) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::Forbidden)
                }
            }
        };

        debug!(
            path,
            subject = identity.map(|i| i.subject.as_str()).unwrap_or("anonymous"),
            ?decision,
            "Authorization decision"
        );
        decision
    }
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new(Self::default_rules())
    }
}
