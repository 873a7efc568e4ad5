//! Browser sessions created after a successful OAuth callback.
//!
//! Session ids are random and live in memory only (reset on restart).
//! Sessions idle past the configured timeout are rejected on lookup and
//! swept periodically by [`run_session_cleanup`].

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound on session idle time (30 days)
const MAX_IDLE_SECONDS: i64 = 30 * 86_400;

/// One signed-in browser
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSession {
    pub user_id: String,
    pub user_login: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Session id → user mapping
pub struct SessionStore {
    sessions: DashMap<String, UserSession>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Store with a 24 hour idle timeout
    pub fn new() -> Self {
        Self::with_idle_timeout(86_400)
    }

    /// Store whose sessions expire after `idle_seconds` without activity,
    /// clamped to `0..=30 days`
    pub fn with_idle_timeout(idle_seconds: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout: Duration::seconds(idle_seconds.clamp(0, MAX_IDLE_SECONDS)),
        }
    }

    /// Create a session and return its id
    pub fn create(&self, user_id: &str, user_login: &str) -> String {
        self.create_at(user_id, user_login, Utc::now())
    }

    pub(crate) fn create_at(&self, user_id: &str, user_login: &str, now: DateTime<Utc>) -> String {
        let session_id = Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            session_id.clone(),
            UserSession {
                user_id: user_id.to_string(),
                user_login: user_login.to_string(),
                created_at: now,
                last_activity: now,
            },
        );
        session_id
    }

    /// Look up a session, refreshing its last activity time
    ///
    /// An idle session is removed and reported as absent.
    pub fn touch(&self, session_id: &str) -> Option<UserSession> {
        let now = Utc::now();
        if self
            .sessions
            .remove_if(session_id, |_, s| self.is_idle(s, now))
            .is_some()
        {
            return None;
        }
        let mut session = self.sessions.get_mut(session_id)?;
        session.last_activity = now;
        Some(session.clone())
    }

    /// Drop sessions idle past the timeout. Returns how many were removed.
    pub fn cleanup_idle(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !self.is_idle(s, now));
        before.saturating_sub(self.sessions.len())
    }

    fn is_idle(&self, session: &UserSession, now: DateTime<Utc>) -> bool {
        now - session.last_activity > self.idle_timeout
    }

    pub fn remove(&self, session_id: &str) -> Option<UserSession> {
        self.sessions.remove(session_id).map(|(_, s)| s)
    }

    /// Drop every session belonging to `user_id`. Returns how many were removed.
    pub fn remove_user(&self, user_id: &str) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.user_id != user_id);
        before.saturating_sub(self.sessions.len())
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

/// Background task to periodically drop idle sessions
pub async fn run_session_cleanup(store: Arc<SessionStore>, interval_seconds: u64) {
    let mut interval =
        tokio::time::interval(tokio::time::Duration::from_secs(interval_seconds.max(1)));

    loop {
        interval.tick().await;
        let removed = store.cleanup_idle();
        tracing::debug!(
            removed = removed,
            remaining = store.count(),
            "Session cleanup complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_touch() {
        let store = SessionStore::new();
        let id = store.create("42", "octocat");
        assert_eq!(id.len(), 32);

        let session = store.touch(&id).unwrap();
        assert_eq!(session.user_id, "42");
        assert_eq!(session.user_login, "octocat");
        assert!(session.last_activity >= session.created_at);

        assert!(store.touch("unknown").is_none());
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new();
        let id = store.create("42", "octocat");

        assert!(store.remove(&id).is_some());
        assert!(store.remove(&id).is_none());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_remove_user_drops_all_sessions() {
        let store = SessionStore::new();
        store.create("42", "octocat");
        store.create("42", "octocat");
        let other = store.create("7", "hubot");

        assert_eq!(store.remove_user("42"), 2);
        assert_eq!(store.count(), 1);
        assert!(store.touch(&other).is_some());
    }

    #[test]
    fn test_idle_session_rejected_on_touch() {
        let store = SessionStore::with_idle_timeout(3600);
        let stale = store.create_at("42", "octocat", Utc::now() - Duration::seconds(3601));

        assert!(store.touch(&stale).is_none());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_cleanup_idle() {
        let store = SessionStore::with_idle_timeout(3600);
        store.create_at("42", "octocat", Utc::now() - Duration::hours(5));
        store.create_at("7", "hubot", Utc::now() - Duration::hours(2));
        let fresh = store.create("42", "octocat");

        assert_eq!(store.count(), 3);
        assert_eq!(store.cleanup_idle(), 2);
        assert_eq!(store.count(), 1);
        assert!(store.touch(&fresh).is_some());
    }
}
