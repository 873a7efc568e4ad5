// Configuration (TOML + environment)
pub mod config;

// Error taxonomy
pub mod error;

// Credential records and the in-memory token store
pub mod credentials;

// GitHub OAuth authorization code flow
pub mod oauth;

// Stored token → static token → anonymous resolution
pub mod resolver;

// Read-side status queries
pub mod status;

// Browser sessions
pub mod session;

// HTTP API
pub mod api;
