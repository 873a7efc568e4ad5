use super::AppConfig;
use crate::credentials::parse_scope;

impl AppConfig {
    /// Overlay environment variables on top of the file/default values.
    ///
    /// Malformed numeric values are ignored and the existing value is kept.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup (the environment in production).
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GITHUB_CLIENT_ID") {
            self.oauth.client_id = v.trim().to_string();
        }
        if let Some(v) = lookup("GITHUB_CLIENT_SECRET") {
            self.oauth.client_secret = v.trim().to_string();
        }
        if let Some(v) = lookup("GITHUB_REDIRECT_URI") {
            self.oauth.redirect_uri = v.trim().to_string();
        }
        if let Some(v) = lookup("GITHUB_OAUTH_SCOPE") {
            let scopes = parse_scope(&v);
            if !scopes.is_empty() {
                self.oauth.scopes = scopes;
            }
        }
        if let Some(v) = lookup("GITHUB_TOKEN") {
            let v = v.trim();
            if !v.is_empty() {
                self.github.fallback_token = Some(v.to_string());
            }
        }
        if let Some(v) = lookup("GITHUB_API_URL") {
            self.github.api_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("HOST") {
            self.server.host = v.trim().to_string();
        }

        // PORT (set by hosting platforms) wins over MAIN_SERVER_PORT
        let port = lookup("PORT").or_else(|| lookup("MAIN_SERVER_PORT"));
        if let Some(n) = port.and_then(|v| v.trim().parse::<u16>().ok()) {
            self.server.port = n;
        }

        if let Some(v) = lookup("REPOCHAT_CORS_ORIGINS") {
            self.server.cors_origins = parse_scope(&v);
        }
        if let Some(n) = lookup("REPOCHAT_STATE_EXPIRY_SECONDS").and_then(|v| v.parse::<i64>().ok()) {
            self.oauth.state_expiry_seconds = n;
        }
        if let Some(n) =
            lookup("REPOCHAT_STATE_CLEANUP_INTERVAL_SECONDS").and_then(|v| v.parse::<u64>().ok())
        {
            self.oauth.state_cleanup_interval_seconds = n;
        }
        if let Some(n) =
            lookup("REPOCHAT_EXCHANGE_TIMEOUT_SECONDS").and_then(|v| v.parse::<u64>().ok())
        {
            self.oauth.exchange_timeout_seconds = n;
        }
        if let Some(b) = lookup("REPOCHAT_SECURE_COOKIE").and_then(|v| v.parse::<bool>().ok()) {
            self.session.secure_cookie = b;
        }
        if let Some(n) =
            lookup("REPOCHAT_SESSION_IDLE_SECONDS").and_then(|v| v.parse::<i64>().ok())
        {
            self.session.idle_timeout_seconds = n;
        }
    }
}
