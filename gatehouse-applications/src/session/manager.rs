//! Session Authenticator
//!
//! Resolves the caller from a server-side session and drives the session
//! login/logout/current-user flows.

use super::SessionStore;
use crate::auth::{AuthSource, Authenticator, RequestCredentials};
use crate::ApplicationResult;
use async_trait::async_trait;
use gatehouse_core::{CredentialVerifier, Identity, UserAccount, UserDirectory};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct SessionAuthenticator {
    store: Arc<SessionStore>,
    directory: Arc<dyn UserDirectory>,
}

impl SessionAuthenticator {
    pub fn new(store: Arc<SessionStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Verify credentials, stamp the last login and open a session.
    ///
    /// Returns the new session id and the account, or `None` on bad credentials.
    pub async fn login(
        &self,
        verifier: &dyn CredentialVerifier,
        username: &str,
        password: &str,
    ) -> ApplicationResult<Option<(String, UserAccount)>> {
        let Some(account) = verifier.verify(username, password).await? else {
            warn!(username, "Session login rejected");
            return Ok(None);
        };

        self.directory.record_login(&account.username).await?;
        let session_id = self.store.create(&account);
        info!(username = %account.username, "Session login succeeded");
        Ok(Some((session_id, account)))
    }

    /// Invalidate the session; returns whether one existed
    pub fn logout(&self, session_id: &str) -> bool {
        self.store.invalidate(session_id)
    }

    /// Account behind a live session
    pub async fn current_user(&self, session_id: &str) -> ApplicationResult<Option<UserAccount>> {
        let Some(session) = self.store.resolve(session_id) else {
            return Ok(None);
        };
        Ok(self.directory.find_by_username(&session.username).await?)
    }
}

#[async_trait]
impl Authenticator for SessionAuthenticator {
    fn source(&self) -> AuthSource {
        AuthSource::Session
    }

    async fn authenticate(&self, credentials: &RequestCredentials) -> Option<Identity> {
        let session_id = credentials.session_id.as_deref()?;
        let session = self.store.resolve(session_id)?;

        match self.directory.find_by_username(&session.username).await {
            Ok(Some(account)) => Some(account.identity()),
            Ok(None) => {
                debug!(username = %session.username, "Session user no longer exists");
                None
            }
            Err(e) => {
                warn!(username = %session.username, error = %e, "Session user lookup failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for SessionAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthenticator")
            .field("sessions", &self.store.len())
            .finish()
    }
}
