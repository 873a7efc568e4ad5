//! Read-side queries over the token store.
//!
//! None of these views carries a raw access token.

use crate::credentials::TokenStore;
use crate::error::{AuthError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Authentication summary for one user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obtained_at: Option<DateTime<Utc>>,
    pub message: String,
}

impl AuthStatus {
    fn unauthenticated(message: &str) -> Self {
        Self {
            authenticated: false,
            user_login: None,
            scope: None,
            obtained_at: None,
            message: message.to_string(),
        }
    }
}

/// Administrative token metadata with the secret redacted
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TokenInfo {
    pub user_id: String,
    pub user_login: String,
    pub token_type: String,
    pub scope: Vec<String>,
    /// First characters of the token followed by an ellipsis
    pub token_preview: String,
    pub token_length: usize,
    pub obtained_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Authentication status for `user_id`.
///
/// An unknown user is reported as unauthenticated, not as an error. A stored
/// record that has expired is evicted and reported the same way.
pub fn status(store: &TokenStore, user_id: &str) -> AuthStatus {
    let Some(record) = store.get(user_id) else {
        return AuthStatus::unauthenticated("User not authenticated");
    };

    let now = Utc::now();
    if !record.is_valid(now) {
        if store.remove_if_invalid(user_id, now).is_some() {
            info!(user_id = %user_id, "Evicted expired credential");
        }
        return AuthStatus::unauthenticated("Token expired or invalid");
    }

    AuthStatus {
        authenticated: true,
        user_login: Some(record.user_login),
        scope: Some(record.scope),
        obtained_at: Some(record.obtained_at),
        message: "User is authenticated".to_string(),
    }
}

/// Redacted token metadata for `user_id`
pub fn token_info(store: &TokenStore, user_id: &str) -> Result<TokenInfo> {
    let record = store
        .get(user_id)
        .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;

    Ok(TokenInfo {
        token_preview: record.token_preview(),
        token_length: record.access_token.chars().count(),
        user_id: record.user_id,
        user_login: record.user_login,
        token_type: record.token_type,
        scope: record.scope,
        obtained_at: record.obtained_at,
        expires_at: record.expires_at,
    })
}

/// Authenticated user ids in insertion order
pub fn list_users(store: &TokenStore) -> Vec<String> {
    store.list_ids()
}
