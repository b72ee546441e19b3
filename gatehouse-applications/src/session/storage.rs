//! Session Store - in-memory sessions with idle expiry

use super::Session;
use crate::ratelimit::Sweep;
use dashmap::DashMap;
use gatehouse_core::{SharedClock, UserAccount};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    idle_timeout: Duration,
    clock: SharedClock,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration, clock: SharedClock) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
            clock,
        }
    }

    /// Open a session for `account`, returning its id
    pub fn create(&self, account: &UserAccount) -> String {
        let session = Session::new(account, self.clock.now());
        let id = session.id.clone();
        self.sessions.insert(id.clone(), session);
        info!(username = %account.username, "Session created");
        id
    }

    /// Live session for `id`, touching its last-access time.
    ///
    /// An expired session is removed and reported as absent.
    pub fn resolve(&self, id: &str) -> Option<Session> {
        let now = self.clock.now();
        {
            let mut session = self.sessions.get_mut(id)?;
            if !session.is_expired(now, self.idle_timeout) {
                session.touch(now);
                return Some(session.clone());
            }
        }

        if self
            .sessions
            .remove_if(id, |_, session| session.is_expired(now, self.idle_timeout))
            .is_some()
        {
            debug!("Dropped expired session on access");
        }
        None
    }

    /// Remove a session; returns whether it existed
    pub fn invalidate(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id);
        if let Some((_, session)) = &removed {
            info!(username = %session.username, "Session invalidated");
        }
        removed.is_some()
    }

    /// Remove every idle-expired session; returns how many went
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_expired(now, self.idle_timeout));
        before.saturating_sub(self.sessions.len())
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Sweep for SessionStore {
    fn name(&self) -> &'static str {
        "sessions"
    }

    fn sweep(&self) -> usize {
        self.purge_expired()
    }
}
