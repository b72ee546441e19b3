//! Core trait definitions
//!
//! The user directory and credential verification are external collaborators:
//! the authentication engines only ever reach user records through these traits.

use crate::error::GatehouseResult;
use crate::types::*;
use async_trait::async_trait;

/// Read access to stored user accounts
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up an account by its exact username
    async fn find_by_username(&self, username: &str) -> GatehouseResult<Option<UserAccount>>;

    /// Look up an account by id
    async fn find_by_id(&self, id: u64) -> GatehouseResult<Option<UserAccount>>;

    /// Record a successful login for the named account
    async fn record_login(&self, username: &str) -> GatehouseResult<()>;

    /// All accounts passing the filter, ordered by id
    async fn list(&self, filter: &UserFilter) -> GatehouseResult<Vec<UserAccount>>;
}

/// Username/password verification
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns the account when the password matches, `None` otherwise.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to callers.
    async fn verify(&self, username: &str, password: &str) -> GatehouseResult<Option<UserAccount>>;
}
