pub mod env;

use serde::Deserialize;
use std::path::Path;

/// Complete service configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// OAuth application registration and flow tuning
#[derive(Clone, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// How long a login attempt's state token stays valid (seconds)
    #[serde(default = "default_state_expiry")]
    pub state_expiry_seconds: i64,
    /// How often expired state tokens are swept (seconds)
    #[serde(default = "default_state_cleanup_interval")]
    pub state_cleanup_interval_seconds: u64,
    /// Upper bound on the code exchange and profile lookup calls (seconds)
    #[serde(default = "default_exchange_timeout")]
    pub exchange_timeout_seconds: u64,
}

fn default_scopes() -> Vec<String> {
    vec!["repo".to_string(), "user".to_string(), "read:org".to_string()]
}

fn default_authorize_url() -> String {
    "https://github.com/login/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://github.com/login/oauth/access_token".to_string()
}

fn default_state_expiry() -> i64 {
    600
}

fn default_state_cleanup_interval() -> u64 {
    60
}

fn default_exchange_timeout() -> u64 {
    10
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            scopes: default_scopes(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            state_expiry_seconds: default_state_expiry(),
            state_cleanup_interval_seconds: default_state_cleanup_interval(),
            exchange_timeout_seconds: default_exchange_timeout(),
        }
    }
}

impl OAuthConfig {
    /// OAuth routes are enabled only when both client credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

// Hand-written so the client secret never lands in logs.
impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("state_expiry_seconds", &self.state_expiry_seconds)
            .field(
                "state_cleanup_interval_seconds",
                &self.state_cleanup_interval_seconds,
            )
            .field("exchange_timeout_seconds", &self.exchange_timeout_seconds)
            .finish()
    }
}

/// Downstream GitHub API configuration
#[derive(Clone, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Static token used when no per-user OAuth credential is available
    #[serde(default)]
    pub fallback_token: Option<String>,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            fallback_token: None,
        }
    }
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("fallback_token_set", &self.fallback_token.is_some())
            .finish()
    }
}

/// Browser session cookie configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Adds the `Secure` attribute to the session cookie
    #[serde(default)]
    pub secure_cookie: bool,
    /// Sessions idle longer than this are dropped (seconds)
    #[serde(default = "default_session_idle")]
    pub idle_timeout_seconds: i64,
    /// How often idle sessions are swept (seconds)
    #[serde(default = "default_session_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

fn default_cookie_name() -> String {
    "session_id".to_string()
}

fn default_session_idle() -> i64 {
    86_400
}

fn default_session_cleanup_interval() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure_cookie: false,
            idle_timeout_seconds: default_session_idle(),
            cleanup_interval_seconds: default_session_cleanup_interval(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    let config: AppConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.oauth.scopes, vec!["repo", "user", "read:org"]);
        assert_eq!(config.oauth.state_expiry_seconds, 600);
        assert_eq!(config.oauth.exchange_timeout_seconds, 10);
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.session.cookie_name, "session_id");
        assert_eq!(config.session.idle_timeout_seconds, 86_400);
        assert!(!config.oauth.is_configured());
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 9000
            cors_origins = ["http://localhost:3000"]

            [oauth]
            client_id = "Iv1.abc"
            client_secret = "shh"
            redirect_uri = "http://localhost:9000/auth/callback"
            scopes = ["repo"]
            state_expiry_seconds = 120

            [github]
            fallback_token = "ghp_static"
        "#;

        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
        assert!(config.oauth.is_configured());
        assert_eq!(config.oauth.scopes, vec!["repo"]);
        assert_eq!(config.oauth.state_expiry_seconds, 120);
        assert_eq!(config.github.fallback_token.as_deref(), Some("ghp_static"));
    }

    #[test]
    fn test_partial_config() {
        // Missing sections and fields use defaults
        let toml = r#"
            [oauth]
            client_id = "only-id"
        "#;

        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.oauth.client_id, "only-id");
        assert!(!config.oauth.is_configured());
        assert_eq!(config.oauth.token_url, "https://github.com/login/oauth/access_token");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.oauth.client_secret = "super-secret-value".to_string();
        config.github.fallback_token = Some("ghp_fallback_value".to_string());

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("ghp_fallback_value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 8123").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 8123);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("/nonexistent/repochat.toml").is_err());
    }
}
