//! Error taxonomy for the authentication flow.
//!
//! Every variant is scoped to a single request or flow attempt; none of them
//! is fatal to the process. Messages never carry token values or the client
//! secret.

/// Result type alias for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors surfaced by the OAuth flow controller and the status queries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// Client id or client secret is unset. OAuth routes are disabled.
    #[error("GitHub OAuth not configured. Set GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET")]
    OAuthNotConfigured,

    /// Callback state is unknown, expired or already consumed.
    #[error("Invalid or expired OAuth state parameter")]
    InvalidState,

    /// Callback arrived without an authorization code.
    #[error("Authorization code not provided")]
    MissingCode,

    /// The provider redirected back with an `error` parameter.
    #[error("OAuth authorization denied: {error} - {description}")]
    AuthorizationDenied { error: String, description: String },

    /// The provider rejected the code (expired, reused, bad client secret).
    #[error("Token exchange failed: {0}")]
    ExchangeFailed(String),

    /// Network failure talking to the identity provider or downstream API.
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// No credential stored for the given user id.
    #[error("User not authenticated: {0}")]
    UserNotFound(String),

    /// The profile lookup succeeded but carried no usable user id.
    #[error("Failed to get user information from token")]
    IdentityUnresolved,
}

impl AuthError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::OAuthNotConfigured => "oauth_not_configured",
            AuthError::InvalidState => "invalid_state",
            AuthError::MissingCode => "missing_code",
            AuthError::AuthorizationDenied { .. } => "authorization_denied",
            AuthError::ExchangeFailed(_) => "exchange_failed",
            AuthError::UpstreamUnavailable(_) => "upstream_unavailable",
            AuthError::UserNotFound(_) => "user_not_found",
            AuthError::IdentityUnresolved => "identity_unresolved",
        }
    }

    /// Whether restarting the login flow is the expected recovery.
    pub fn restart_login(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidState
                | AuthError::MissingCode
                | AuthError::AuthorizationDenied { .. }
                | AuthError::ExchangeFailed(_)
                | AuthError::IdentityUnresolved
        )
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors may embed the request URL; strip it so query
        // parameters never reach logs or responses.
        AuthError::UpstreamUnavailable(e.without_url().to_string())
    }
}
