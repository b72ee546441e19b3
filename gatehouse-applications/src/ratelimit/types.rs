//! Rate limit policy types

use crate::{ApplicationError, ApplicationResult};
use gatehouse_core::PolicyConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Named budgets a client is charged against
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Token login attempts
    Login,
    /// Every other API call
    Api,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Login => "login",
            PolicyKind::Api => "api",
        }
    }

    /// Bucket key for a client under this policy, e.g. `login:10.0.0.1`
    pub fn bucket_key(&self, client_key: &str) -> String {
        format!("{}:{}", self.as_str(), client_key)
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capacity plus refill rate of a token bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePolicy {
    capacity: u32,
    refill_tokens: u32,
    refill_period: Duration,
}

impl RatePolicy {
    pub fn new(capacity: u32, refill_tokens: u32, refill_period: Duration) -> ApplicationResult<Self> {
        if capacity == 0 {
            return Err(ApplicationError::invalid_policy("capacity must be greater than 0"));
        }
        if refill_tokens == 0 || refill_period.is_zero() {
            return Err(ApplicationError::invalid_policy(
                "refill rate must be greater than 0",
            ));
        }
        Ok(Self {
            capacity,
            refill_tokens,
            refill_period,
        })
    }

    /// `tokens` capacity, refilled by `tokens` every minute
    pub fn per_minute(tokens: u32) -> ApplicationResult<Self> {
        Self::new(tokens, tokens, Duration::from_secs(60))
    }

    pub fn from_config(config: &PolicyConfig) -> ApplicationResult<Self> {
        Self::new(
            config.capacity,
            config.refill_tokens,
            Duration::from_secs(config.refill_period_secs),
        )
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_period(&self) -> Duration {
        self.refill_period
    }

    /// Tokens earned over `elapsed`, uncapped
    pub fn tokens_for(&self, elapsed: Duration) -> f64 {
        elapsed.as_secs_f64() * f64::from(self.refill_tokens) / self.refill_period.as_secs_f64()
    }
}
