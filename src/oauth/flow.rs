//! OAuth flow controller.
//!
//! Drives one login attempt from authorization URL to stored credential:
//!
//! ```text
//! Unauthenticated ──begin_login──▶ PendingCallback ──complete_callback──▶ Authenticated
//!        ▲                              │ expiry / exchange failure           │
//!        └──────────────────────────────┴──────────── logout / restart ◀──────┘
//! ```

use super::exchange::OAuthClient;
use super::provider::OAuthProvider;
use super::state_manager::{state_prefix, StateManager};
use crate::config::AppConfig;
use crate::credentials::{CredentialRecord, TokenStore};
use crate::error::{AuthError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where to send the user to authorize, plus the state bound to the attempt
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationRequest {
    pub auth_url: String,
    pub state: String,
}

/// Query parameters GitHub appends to the callback URL
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Coordinates the state manager, the provider client and the token store
pub struct AuthFlow {
    provider: Option<OAuthProvider>,
    client: OAuthClient,
    states: StateManager,
    tokens: Arc<TokenStore>,
}

impl AuthFlow {
    pub fn new(
        provider: Option<OAuthProvider>,
        client: OAuthClient,
        states: StateManager,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            provider,
            client,
            states,
            tokens,
        }
    }

    /// Build the flow from configuration. Missing client credentials leave
    /// the flow in the disabled state rather than failing.
    pub fn from_config(config: &AppConfig, tokens: Arc<TokenStore>) -> Result<Self> {
        let provider = OAuthProvider::from_config(config);
        if provider.is_none() {
            warn!("GitHub OAuth not configured; login routes disabled, falling back to static/anonymous access");
        }
        let client = OAuthClient::new(std::time::Duration::from_secs(
            config.oauth.exchange_timeout_seconds,
        ))?;
        let states = StateManager::new(config.oauth.state_expiry_seconds);

        Ok(Self::new(provider, client, states, tokens))
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn states(&self) -> &StateManager {
        &self.states
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Start a login attempt: store a fresh state and build the authorization URL
    pub fn begin_login(&self) -> Result<AuthorizationRequest> {
        let provider = self.provider.as_ref().ok_or(AuthError::OAuthNotConfigured)?;

        let state = self.states.create_state();
        let auth_url = provider.build_auth_url(&state);

        info!(
            state = %state_prefix(&state),
            pending = self.states.count(),
            "Generated OAuth state"
        );

        Ok(AuthorizationRequest { auth_url, state })
    }

    /// Handle the raw callback, including a provider-reported `error`
    pub async fn handle_callback(&self, params: &CallbackParams) -> Result<CredentialRecord> {
        if let Some(error) = &params.error {
            // Burn the attempt so the state cannot be reused
            if let Some(state) = &params.state {
                self.states.validate_and_consume(state);
            }
            let description = params
                .error_description
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!(error = %error, description = %description, "OAuth authorization denied");
            return Err(AuthError::AuthorizationDenied {
                error: error.clone(),
                description,
            });
        }

        self.complete_callback(params.code.as_deref(), params.state.as_deref())
            .await
    }

    /// Validate the state, exchange the code and store the resulting credential
    ///
    /// The state is consumed before the exchange, so a failed exchange still
    /// cannot be replayed. No retry is attempted; the caller restarts the flow.
    pub async fn complete_callback(
        &self,
        code: Option<&str>,
        state: Option<&str>,
    ) -> Result<CredentialRecord> {
        let provider = self.provider.as_ref().ok_or(AuthError::OAuthNotConfigured)?;

        let state = state.filter(|s| !s.is_empty()).ok_or_else(|| {
            warn!("OAuth callback without state parameter");
            AuthError::InvalidState
        })?;

        self.states.validate_and_consume(state).ok_or_else(|| {
            warn!(state = %state_prefix(state), "Invalid or expired OAuth state");
            AuthError::InvalidState
        })?;
        debug!(state = %state_prefix(state), "OAuth state validated and consumed");

        let code = code.filter(|c| !c.is_empty()).ok_or_else(|| {
            warn!("OAuth callback without authorization code");
            AuthError::MissingCode
        })?;

        let grant = self.client.exchange_code(provider, code).await.map_err(|e| {
            warn!(error = %e, "Token exchange failed");
            e
        })?;

        let identity = self
            .client
            .fetch_identity(&provider.api_url, &grant.access_token)
            .await
            .map_err(|e| {
                warn!(error = %e, "Identity lookup failed");
                e
            })?;

        let obtained_at = Utc::now();
        let record = CredentialRecord {
            user_id: identity.id.to_string(),
            user_login: identity.login,
            access_token: grant.access_token,
            token_type: grant.token_type,
            scope: grant.scope,
            obtained_at,
            expires_at: grant
                .expires_in
                .and_then(|seconds| expiry_after(obtained_at, seconds)),
        };

        self.tokens.put(record.clone());

        info!(
            user_id = %record.user_id,
            user_login = %record.user_login,
            scope = ?record.scope,
            "OAuth flow completed successfully"
        );

        Ok(record)
    }

    /// Drop the stored credential for `user_id`. Idempotent.
    pub fn logout(&self, user_id: &str) -> bool {
        let removed = self.tokens.delete(user_id).is_some();
        info!(user_id = %user_id, had_credential = removed, "User logged out");
        removed
    }
}

/// Absolute expiry for a provider-reported lifetime. A lifetime too large to
/// represent is treated as no expiry.
fn expiry_after(obtained_at: DateTime<Utc>, seconds: i64) -> Option<DateTime<Utc>> {
    let expiry = Duration::try_seconds(seconds).and_then(|d| obtained_at.checked_add_signed(d));
    if expiry.is_none() {
        warn!(expires_in = seconds, "Ignoring out-of-range token lifetime");
    }
    expiry
}
