//! GitHub OAuth 2.0 authorization code flow.
//!
//! 1. GET /auth/login → `begin_login` stores a CSRF state, redirect to GitHub
//! 2. User authorizes on github.com
//! 3. GitHub redirects to /auth/callback?code=..&state=..
//! 4. `complete_callback` consumes the state, exchanges the code, looks up
//!    the user's profile and stores the credential

mod exchange;
mod flow;
mod identity;
mod provider;
mod state_manager;

pub use exchange::{OAuthClient, TokenGrant};
pub use flow::{AuthFlow, AuthorizationRequest, CallbackParams};
pub use identity::GitHubIdentity;
pub use provider::OAuthProvider;
pub use state_manager::{
    generate_state, run_state_cleanup, state_prefix, PendingState, StateEntry, StateManager,
};
