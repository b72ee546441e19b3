//! Application state shared by every handler and middleware

use crate::{
    auth::{
        jwt::{TokenAuthenticator, TokenService},
        users::{MemoryUserStore, PasswordHashing},
    },
    WebResult,
};
use gatehouse_applications::{
    ratelimit::IdleBucketSweep, AuthChain, AuthorizationGate, BucketStore, MaintenanceSweeper,
    RateLimiter, SessionAuthenticator, SessionStore,
};
use gatehouse_core::{
    CredentialVerifier, GatehouseConfig, SharedClock, SystemClock, UserDirectory,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Path prefix of the token-authenticated API family
pub const TOKEN_API_PREFIX: &str = "/api/v2/";

#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<GatehouseConfig>,
    /// User lookups
    pub directory: Arc<dyn UserDirectory>,
    /// Password checks
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Login and API rate limits over one shared bucket store
    pub rate_limiter: RateLimiter,
    /// Server-side sessions
    pub sessions: SessionAuthenticator,
    /// Access and refresh token issuing
    pub tokens: Arc<TokenService>,
    /// Route table
    pub gate: Arc<AuthorizationGate>,
    /// Session first, then bearer token
    pub auth_chain: Arc<AuthChain>,
    /// Bearer token only, for the `/api/v2` family
    pub token_chain: Arc<AuthChain>,
    pub started_at: Instant,
}

impl AppState {
    /// Create a new application state with the seeded user store
    pub fn new(config: GatehouseConfig) -> WebResult<Self> {
        let users = Arc::new(MemoryUserStore::seeded(PasswordHashing::default())?);
        Self::with_parts(config, users, SystemClock::shared())
    }

    /// Assemble state around an existing user store and clock
    pub fn with_parts(
        config: GatehouseConfig,
        users: Arc<MemoryUserStore>,
        clock: SharedClock,
    ) -> WebResult<Self> {
        let secret = config.signing_secret()?;

        let buckets = Arc::new(BucketStore::new(clock.clone()));
        let rate_limiter = RateLimiter::from_config(&config.rate_limit, buckets)?;

        let session_store = Arc::new(SessionStore::new(
            config.auth.session_idle_timeout(),
            clock.clone(),
        ));
        let sessions = SessionAuthenticator::new(session_store, users.clone());

        let tokens = Arc::new(TokenService::new(
            &secret,
            config.auth.access_token_ttl(),
            config.auth.refresh_token_ttl(),
            clock,
        ));

        let bearer = Arc::new(TokenAuthenticator::new(tokens.clone(), users.clone()));
        let auth_chain = AuthChain::new()
            .with(Arc::new(sessions.clone()))
            .with(bearer.clone());
        let token_chain = AuthChain::new().with(bearer);

        info!(
            users = users.len(),
            authenticators = auth_chain.len(),
            "Application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            directory: users.clone(),
            verifier: users,
            rate_limiter,
            sessions,
            tokens,
            gate: Arc::new(AuthorizationGate::default()),
            auth_chain: Arc::new(auth_chain),
            token_chain: Arc::new(token_chain),
            started_at: Instant::now(),
        })
    }

    /// Authenticators consulted for a request path; `/api/v2/` is bearer only
    pub fn chain_for(&self, path: &str) -> &AuthChain {
        if path.starts_with(TOKEN_API_PREFIX) {
            &self.token_chain
        } else {
            &self.auth_chain
        }
    }

    /// Periodic eviction of idle buckets and expired sessions
    pub fn sweeper(&self) -> MaintenanceSweeper {
        let limits = &self.config.rate_limit;
        MaintenanceSweeper::new(limits.sweep_interval())
            .with_target(Arc::new(IdleBucketSweep::new(
                self.rate_limiter.store().clone(),
                limits.idle_retention(),
            )))
            .with_target(self.sessions.store().clone())
    }
}
