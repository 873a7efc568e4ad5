//! OAuth token exchange logic.
//!
//! Handles exchanging authorization codes for access tokens.

use super::provider::OAuthProvider;
use crate::error::{AuthError, Result};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("repochat/", env!("CARGO_PKG_VERSION"));

/// Token endpoint response. GitHub answers 200 with an `error` field on rejection.
#[derive(Deserialize, Debug, Default)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Access token issued by the provider
#[derive(Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub token_type: String,
    pub scope: Vec<String>,
    pub expires_in: Option<i64>,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &crate::credentials::redact_token(&self.access_token))
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// HTTP client for the provider's token and profile endpoints.
///
/// Every call is bounded by the configured timeout.
#[derive(Clone)]
pub struct OAuthClient {
    pub(super) http_client: Client,
}

impl OAuthClient {
    /// Create a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http_client })
    }

    /// Exchange authorization code for access token
    ///
    /// # Returns
    /// * `Ok(TokenGrant)` - Access token, scope and optional lifetime
    /// * `Err(ExchangeFailed)` - Provider rejected the code or client credentials
    /// * `Err(UpstreamUnavailable)` - Transport failure, timeout or provider 5xx
    pub async fn exchange_code(&self, provider: &OAuthProvider, code: &str) -> Result<TokenGrant> {
        let mut form_data = vec![
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];
        if !provider.redirect_uri.is_empty() {
            form_data.push(("redirect_uri", provider.redirect_uri.as_str()));
        }

        tracing::debug!(token_url = %provider.token_url, "Exchanging authorization code for token");

        let response = self
            .http_client
            .post(&provider.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&form_data)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let is_form = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        let body = response.text().await.map_err(transport_error)?;

        if status.is_server_error() {
            return Err(AuthError::UpstreamUnavailable(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let token_response = parse_token_response(&body, is_form);

        if !status.is_success() {
            return Err(AuthError::ExchangeFailed(rejection_reason(
                status,
                token_response.as_ref(),
            )));
        }

        let token_response = token_response.ok_or_else(|| {
            AuthError::ExchangeFailed("Failed to parse token response".to_string())
        })?;

        if let Some(error) = token_response.error {
            return Err(AuthError::ExchangeFailed(
                token_response.error_description.unwrap_or(error),
            ));
        }

        let access_token = token_response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AuthError::ExchangeFailed("Token response missing access_token".to_string())
            })?;

        let grant = TokenGrant {
            access_token,
            token_type: token_response
                .token_type
                .unwrap_or_else(|| "bearer".to_string()),
            scope: crate::credentials::parse_scope(token_response.scope.as_deref().unwrap_or("")),
            expires_in: token_response.expires_in,
        };

        tracing::debug!(
            scope = ?grant.scope,
            expires_in = ?grant.expires_in,
            "Token exchange successful"
        );

        Ok(grant)
    }
}

fn parse_token_response(body: &str, is_form: bool) -> Option<TokenResponse> {
    if is_form {
        serde_urlencoded::from_str(body).ok()
    } else {
        serde_json::from_str(body).ok()
    }
}

fn rejection_reason(status: StatusCode, parsed: Option<&TokenResponse>) -> String {
    let detail = parsed.and_then(|r| r.error_description.clone().or_else(|| r.error.clone()));
    match detail {
        Some(detail) => format!("{} ({})", detail, status),
        None => format!("token endpoint returned {}", status),
    }
}

/// Map a reqwest failure to `UpstreamUnavailable`, naming timeouts explicitly.
pub(super) fn transport_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::UpstreamUnavailable("request to GitHub timed out".to_string())
    } else {
        AuthError::from(e)
    }
}
