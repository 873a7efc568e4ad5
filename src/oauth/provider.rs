//! GitHub OAuth provider configuration.

use crate::config::AppConfig;

/// Everything needed to talk to the identity provider for one OAuth app
#[derive(Clone)]
pub struct OAuthProvider {
    /// OAuth authorization endpoint URL
    pub authorize_url: String,

    /// OAuth token exchange endpoint URL
    pub token_url: String,

    /// REST API base URL, used for the profile lookup
    pub api_url: String,

    /// Requested OAuth scopes
    pub scopes: Vec<String>,

    pub client_id: String,

    pub client_secret: String,

    /// Callback URL registered with the OAuth app
    pub redirect_uri: String,
}

impl OAuthProvider {
    /// Build from configuration. None when client id or secret is unset.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.oauth.is_configured() {
            return None;
        }

        Some(Self {
            authorize_url: config.oauth.authorize_url.clone(),
            token_url: config.oauth.token_url.clone(),
            api_url: config.github.api_url.trim_end_matches('/').to_string(),
            scopes: config.oauth.scopes.clone(),
            client_id: config.oauth.client_id.clone(),
            client_secret: config.oauth.client_secret.clone(),
            redirect_uri: config.oauth.redirect_uri.clone(),
        })
    }

    /// Build authorization URL for a login attempt
    pub fn build_auth_url(&self, state: &str) -> String {
        let scopes = self.scopes.join(" ");
        let mut url = format!(
            "{}?client_id={}",
            self.authorize_url,
            urlencoding::encode(&self.client_id)
        );
        // GitHub falls back to the app's registered callback when omitted
        if !self.redirect_uri.is_empty() {
            url.push_str("&redirect_uri=");
            url.push_str(&urlencoding::encode(&self.redirect_uri));
        }
        url.push_str(&format!(
            "&scope={}&state={}&allow_signup=true&response_type=code",
            urlencoding::encode(&scopes),
            urlencoding::encode(state)
        ));
        url
    }
}

impl std::fmt::Debug for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthProvider")
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .field("scopes", &self.scopes)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}
