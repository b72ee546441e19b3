//! Session Types

use chrono::{DateTime, Utc};
use gatehouse_core::UserAccount;
use std::time::{Duration, Instant};

/// Server-side login session
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque UUID v4
    pub id: String,
    pub user_id: u64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    /// Monotonic last-access time, drives idle expiry
    pub last_accessed: Instant,
}

impl Session {
    pub fn new(account: &UserAccount, now: Instant) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: account.id,
            username: account.username.clone(),
            created_at: Utc::now(),
            last_accessed: now,
        }
    }

    pub fn is_expired(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_accessed) > idle_timeout
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_accessed = now;
    }
}
