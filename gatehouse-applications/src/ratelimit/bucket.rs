//! Token bucket with lazy, continuous refill

use super::RatePolicy;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct TokenBucket {
    policy: RatePolicy,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket
    pub fn new(policy: RatePolicy, now: Instant) -> Self {
        Self {
            policy,
            tokens: f64::from(policy.capacity()),
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let capacity = f64::from(self.policy.capacity());
        self.tokens = (self.tokens + self.policy.tokens_for(elapsed)).min(capacity);
        self.last_refill = now;
    }

    /// Refill up to `now`, then take one token if a whole one is available
    pub fn try_consume_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Token count as of `now`, without consuming
    pub fn available_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill);
        (self.tokens + self.policy.tokens_for(elapsed)).min(f64::from(self.policy.capacity()))
    }

    pub fn policy(&self) -> &RatePolicy {
        &self.policy
    }
}
