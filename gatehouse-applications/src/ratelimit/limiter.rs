//! Rate Limiter - named policies over a shared bucket store

use super::{BucketStore, PolicyKind, RatePolicy};
use crate::ApplicationResult;
use gatehouse_core::RateLimitConfig;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<BucketStore>,
    login: RatePolicy,
    api: RatePolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<BucketStore>, login: RatePolicy, api: RatePolicy) -> Self {
        Self { store, login, api }
    }

    pub fn from_config(config: &RateLimitConfig, store: Arc<BucketStore>) -> ApplicationResult<Self> {
        Ok(Self::new(
            store,
            RatePolicy::from_config(&config.login)?,
            RatePolicy::from_config(&config.api)?,
        ))
    }

    pub fn policy(&self, kind: PolicyKind) -> &RatePolicy {
        match kind {
            PolicyKind::Login => &self.login,
            PolicyKind::Api => &self.api,
        }
    }

    /// Charge one request from `client_key` against `kind`
    pub fn try_consume(&self, kind: PolicyKind, client_key: &str) -> bool {
        let key = kind.bucket_key(client_key);
        let allowed = self.store.try_consume(&key, self.policy(kind));
        if allowed {
            debug!(policy = %kind, client = %client_key, "Rate limit check passed");
        } else {
            warn!(policy = %kind, client = %client_key, "Rate limit exceeded");
        }
        allowed
    }

    /// Remaining tokens for a client under `kind`
    pub fn remaining(&self, kind: PolicyKind, client_key: &str) -> Option<f64> {
        self.store.peek(&kind.bucket_key(client_key))
    }

    pub fn store(&self) -> &Arc<BucketStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::{ManualClock, PolicyConfig};
    use std::time::Duration;

    #[test]
    fn test_policies_are_independent_per_client() {
        let clock = Arc::new(ManualClock::new());
        let mut config = RateLimitConfig::default();
        config.api = PolicyConfig::per_minute(3);
        let limiter =
            RateLimiter::from_config(&config, Arc::new(BucketStore::new(clock.clone()))).unwrap();

        for _ in 0..5 {
            assert!(limiter.try_consume(PolicyKind::Login, "10.0.0.1"));
        }
        assert!(!limiter.try_consume(PolicyKind::Login, "10.0.0.1"));

        // Login exhaustion does not touch the api budget
        assert!(limiter.try_consume(PolicyKind::Api, "10.0.0.1"));
        assert_eq!(limiter.remaining(PolicyKind::Api, "10.0.0.1"), Some(2.0));

        // Nor another client's login budget
        assert!(limiter.try_consume(PolicyKind::Login, "10.0.0.2"));

        clock.advance(Duration::from_secs(60));
        assert!(limiter.try_consume(PolicyKind::Login, "10.0.0.1"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RateLimitConfig::default();
        config.login.capacity = 0;
        assert!(RateLimiter::from_config(&config, Arc::new(BucketStore::default())).is_err());
    }
}
