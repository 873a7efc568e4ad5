//! In-memory credential storage for GitHub OAuth tokens.
//!
//! One [`CredentialRecord`] per authenticated user, held in a lock-guarded
//! [`TokenStore`] shared by every request handler.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │       TokenStore                         │
//! │  - put / get / delete / list_ids         │
//! │  - insertion-ordered, RwLock guarded     │
//! └─────────────────────────────────────────┘
//!          ↓ save              ↑ load
//! ┌─────────────────────────────────────────┐
//! │       CredentialBackend                  │
//! │  - EphemeralBackend (default, no-op)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Security
//!
//! - `Debug` output of a record never includes the access token
//! - Records are lost on restart unless a durable backend is plugged in

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod backend;
mod store;

pub use backend::{CredentialBackend, EphemeralBackend};
pub use store::TokenStore;

/// Stored token and metadata for one authenticated user.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialRecord {
    /// GitHub numeric user id, as a string. Key into the store.
    pub user_id: String,

    /// GitHub login name
    pub user_login: String,

    /// OAuth access token (secret)
    pub access_token: String,

    /// Token type reported by the provider, usually "bearer"
    pub token_type: String,

    /// Granted permission strings (e.g. "repo", "read:org")
    pub scope: Vec<String>,

    /// When the token was issued
    pub obtained_at: DateTime<Utc>,

    /// When the token expires, if the provider reported a lifetime
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// False when the token is empty or past its expiry.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        }
    }

    /// Value for an `Authorization` header on GitHub API calls.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Redacted view of the access token: first 4 characters and an ellipsis.
    pub fn token_preview(&self) -> String {
        redact_token(&self.access_token)
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("user_id", &self.user_id)
            .field("user_login", &self.user_login)
            .field("access_token", &self.token_preview())
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("obtained_at", &self.obtained_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Parse a provider scope string. GitHub separates with commas, RFC 6749 with spaces.
pub fn parse_scope(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Keep only a short prefix of a secret.
pub fn redact_token(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{}…", prefix)
}

#[cfg(test)]
pub(crate) fn sample_record(user_id: &str, token: &str) -> CredentialRecord {
    CredentialRecord {
        user_id: user_id.to_string(),
        user_login: format!("login-{}", user_id),
        access_token: token.to_string(),
        token_type: "bearer".to_string(),
        scope: vec!["repo".to_string(), "user".to_string()],
        obtained_at: Utc::now(),
        expires_at: None,
    }
}
