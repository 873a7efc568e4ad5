//! Per-request credential resolution.
//!
//! An ordered chain of [`CredentialSource`]s, each consulted only when the
//! previous one came back [`Lookup::Absent`]:
//!
//! 1. the caller's stored OAuth credential
//! 2. the statically configured fallback token
//! 3. otherwise [`Resolution::Unauthenticated`]: public API access only

use crate::credentials::TokenStore;
use chrono::Utc;
use std::sync::Arc;

#[cfg(test)]
mod tests;

/// Result of asking one source for a token
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(String),
    Absent,
}

/// Outcome of the whole chain
#[derive(Clone, PartialEq)]
pub enum Resolution {
    Authenticated {
        token: String,
        source: &'static str,
    },
    Unauthenticated,
}

impl Resolution {
    pub fn token(&self) -> Option<&str> {
        match self {
            Resolution::Authenticated { token, .. } => Some(token),
            Resolution::Unauthenticated => None,
        }
    }

    pub fn source(&self) -> Option<&'static str> {
        match self {
            Resolution::Authenticated { source, .. } => Some(source),
            Resolution::Unauthenticated => None,
        }
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Authenticated { source, .. } => f
                .debug_struct("Authenticated")
                .field("source", source)
                .finish_non_exhaustive(),
            Resolution::Unauthenticated => f.write_str("Unauthenticated"),
        }
    }
}

/// One link in the resolution chain
pub trait CredentialSource: Send + Sync {
    /// Short label reported alongside a found token
    fn name(&self) -> &'static str;

    fn lookup(&self, user_id: Option<&str>) -> Lookup;
}

/// Per-user OAuth credential from the token store. Expired records are skipped.
pub struct StoredTokenSource {
    store: Arc<TokenStore>,
}

impl StoredTokenSource {
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }
}

impl CredentialSource for StoredTokenSource {
    fn name(&self) -> &'static str {
        "oauth"
    }

    fn lookup(&self, user_id: Option<&str>) -> Lookup {
        let Some(user_id) = user_id else {
            return Lookup::Absent;
        };
        match self.store.get(user_id) {
            Some(record) if record.is_valid(Utc::now()) => Lookup::Found(record.access_token),
            _ => Lookup::Absent,
        }
    }
}

/// Environment-provided token for non-interactive or legacy use
pub struct StaticTokenSource {
    token: Option<String>,
}

impl StaticTokenSource {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }
}

impl CredentialSource for StaticTokenSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn lookup(&self, _user_id: Option<&str>) -> Lookup {
        match &self.token {
            Some(token) => Lookup::Found(token.clone()),
            None => Lookup::Absent,
        }
    }
}

/// Chain-of-responsibility over credential sources
pub struct FallbackResolver {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl FallbackResolver {
    /// Standard chain: stored OAuth token, then static fallback token
    pub fn new(store: Arc<TokenStore>, fallback_token: Option<String>) -> Self {
        Self::with_sources(vec![
            Box::new(StoredTokenSource::new(store)),
            Box::new(StaticTokenSource::new(fallback_token)),
        ])
    }

    pub fn with_sources(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// First token any source yields, or `Unauthenticated`
    pub fn resolve_credential(&self, user_id: Option<&str>) -> Resolution {
        for source in &self.sources {
            if let Lookup::Found(token) = source.lookup(user_id) {
                tracing::debug!(
                    user_id = user_id.unwrap_or("-"),
                    source = source.name(),
                    "Credential resolved"
                );
                return Resolution::Authenticated {
                    token,
                    source: source.name(),
                };
            }
        }

        tracing::debug!(
            user_id = user_id.unwrap_or("-"),
            "No credential available, using anonymous access"
        );
        Resolution::Unauthenticated
    }
}
