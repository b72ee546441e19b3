//! Bucket Store - concurrent map of client key to token bucket
//!
//! Refill and deduct for one key happen while holding that key's shard write
//! guard, so concurrent requests from the same client never lose updates.

use super::{RatePolicy, TokenBucket};
use dashmap::DashMap;
use gatehouse_core::{SharedClock, SystemClock};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct BucketEntry {
    bucket: TokenBucket,
    last_access: Instant,
}

#[derive(Debug)]
pub struct BucketStore {
    entries: DashMap<String, BucketEntry>,
    clock: SharedClock,
}

impl BucketStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Consume one token for `key`, creating a full bucket on first sight
    pub fn try_consume(&self, key: &str, policy: &RatePolicy) -> bool {
        let now = self.clock.now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| BucketEntry {
                bucket: TokenBucket::new(*policy, now),
                last_access: now,
            });
        entry.last_access = now;
        entry.bucket.try_consume_at(now)
    }

    /// Current token count for `key`, if it has a bucket
    pub fn peek(&self, key: &str) -> Option<f64> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .map(|entry| entry.bucket.available_at(now))
    }

    /// Drop entries untouched for longer than `retention`; returns how many went
    pub fn evict_idle(&self, retention: Duration) -> usize {
        let now = self.clock.now();
        let mut evicted = 0;
        self.entries.retain(|key, entry| {
            let keep = now.saturating_duration_since(entry.last_access) <= retention;
            if !keep {
                debug!(key = %key, "Evicting idle rate limit bucket");
                evicted += 1;
            }
            keep
        });
        evicted
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BucketStore {
    fn default() -> Self {
        Self::new(SystemClock::shared())
    }
}
