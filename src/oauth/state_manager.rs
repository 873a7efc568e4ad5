//! OAuth state management for CSRF protection.
//!
//! Manages temporary state tokens used to bind a login attempt to its callback.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Random bytes per state token (encodes to 43 URL-safe characters)
const STATE_BYTES: usize = 32;

/// Upper bound on how long a login attempt may stay pending (one day)
const MAX_STATE_EXPIRY_SECONDS: i64 = 86_400;

/// OAuth state entry (tracks one pending login attempt)
#[derive(Clone, Debug, PartialEq)]
pub struct StateEntry {
    pub created_at: DateTime<Utc>,
}

/// Pending state as exposed for debugging. Carries only a prefix of the token.
#[derive(Clone, Debug)]
pub struct PendingState {
    pub state_prefix: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// OAuth state manager with explicit expiry
///
/// Expiry is checked on read (`validate_and_consume`) and swept periodically
/// by [`run_state_cleanup`].
#[derive(Clone)]
pub struct StateManager {
    states: Arc<Mutex<HashMap<String, StateEntry>>>,
    expiry_duration: Duration,
}

impl StateManager {
    /// Create a new state manager
    ///
    /// # Arguments
    /// * `expiry_seconds` - How long states remain valid (default: 600 = 10 minutes),
    ///   clamped to `0..=86400`
    pub fn new(expiry_seconds: i64) -> Self {
        let clamped = expiry_seconds.clamp(0, MAX_STATE_EXPIRY_SECONDS);
        if clamped != expiry_seconds {
            tracing::warn!(
                requested = expiry_seconds,
                applied = clamped,
                "OAuth state expiry out of range, clamped"
            );
        }
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            expiry_duration: Duration::seconds(clamped),
        }
    }

    /// Generate a new state token and store it
    pub fn create_state(&self) -> String {
        self.create_state_at(Utc::now())
    }

    pub(crate) fn create_state_at(&self, created_at: DateTime<Utc>) -> String {
        let state = generate_state();
        let mut states = self.states.lock().expect("StateManager lock poisoned");
        states.insert(state.clone(), StateEntry { created_at });
        state
    }

    /// Validate and consume a state token
    ///
    /// Returns the StateEntry if valid and not expired, None otherwise.
    /// The state is removed from the map either way (single-use).
    pub fn validate_and_consume(&self, state: &str) -> Option<StateEntry> {
        let mut states = self.states.lock().expect("StateManager lock poisoned");

        let entry = states.remove(state)?;

        if Utc::now() - entry.created_at > self.expiry_duration {
            return None;
        }

        Some(entry)
    }

    /// Clean up expired states. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut states = self.states.lock().expect("StateManager lock poisoned");
        let now = Utc::now();
        let before = states.len();

        states.retain(|_, entry| now - entry.created_at <= self.expiry_duration);

        before - states.len()
    }

    /// Get count of active states (for debugging/monitoring)
    pub fn count(&self) -> usize {
        self.states.lock().expect("StateManager lock poisoned").len()
    }

    /// Snapshot of pending states, oldest first
    pub fn pending(&self) -> Vec<PendingState> {
        let states = self.states.lock().expect("StateManager lock poisoned");
        let mut pending: Vec<PendingState> = states
            .iter()
            .map(|(state, entry)| PendingState {
                state_prefix: state_prefix(state),
                created_at: entry.created_at,
                expires_at: entry.created_at + self.expiry_duration,
            })
            .collect();
        pending.sort_by_key(|p| p.created_at);
        pending
    }
}

/// 32 random bytes, URL-safe base64 without padding
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Loggable prefix of a state token
pub fn state_prefix(state: &str) -> String {
    state.chars().take(8).collect()
}

/// Background task to periodically clean up expired states
pub async fn run_state_cleanup(manager: StateManager, interval_seconds: u64) {
    let mut interval =
        tokio::time::interval(tokio::time::Duration::from_secs(interval_seconds.max(1)));

    loop {
        interval.tick().await;
        let removed = manager.cleanup_expired();
        tracing::debug!(
            removed = removed,
            remaining = manager.count(),
            "OAuth state cleanup complete"
        );
    }
}
