//! Authentication and Authorization Module
//!
//! - `context`: the per-request security context
//! - `identity`: the authenticator capability and the ordered chain
//! - `permissions`: the path-based authorization gate
//! - `catalog`: built-in role and permission reference data

pub mod catalog;
pub mod context;
pub mod identity;
pub mod permissions;

pub use context::{AuthSource, SecurityContext};
pub use identity::{AuthChain, Authenticator, RequestCredentials};
pub use permissions::{Access, AccessRule, AuthorizationGate, Decision, DenyReason, PathPattern};
