//! Resolves who a freshly issued token belongs to.

use super::exchange::{transport_error, OAuthClient};
use crate::error::{AuthError, Result};
use reqwest::header;
use serde::Deserialize;

/// Subset of `GET /user`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GitHubIdentity {
    pub id: u64,
    pub login: String,
}

#[derive(Deserialize)]
struct UserResponse {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    login: Option<String>,
}

impl OAuthClient {
    /// Fetch the authenticated user's profile
    ///
    /// - 401/403 → `ExchangeFailed` (the new token was not accepted)
    /// - 5xx or transport failure → `UpstreamUnavailable`
    /// - 200 without an id or login → `IdentityUnresolved`
    pub async fn fetch_identity(&self, api_url: &str, access_token: &str) -> Result<GitHubIdentity> {
        let url = format!("{}/user", api_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AuthError::UpstreamUnavailable(format!(
                "GitHub API returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(AuthError::ExchangeFailed(format!(
                "Failed to get user info: {}",
                status
            )));
        }

        let user: UserResponse = response
            .json()
            .await
            .map_err(|_| AuthError::IdentityUnresolved)?;

        let id = user.id.ok_or(AuthError::IdentityUnresolved)?;
        let login = user
            .login
            .filter(|login| !login.is_empty())
            .ok_or(AuthError::IdentityUnresolved)?;
        Ok(GitHubIdentity { id, login })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Duration;

    fn client() -> OAuthClient {
        OAuthClient::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_identity() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/user")
            .match_header("authorization", "Bearer gho_issued")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 583231, "login": "octocat", "name": "The Octocat"}"#)
            .create_async()
            .await;

        let identity = client()
            .fetch_identity(&server.url(), "gho_issued")
            .await
            .unwrap();

        assert_eq!(
            identity,
            GitHubIdentity {
                id: 583231,
                login: "octocat".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_identity_rejected_token() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/user")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Bad credentials"}"#)
            .create_async()
            .await;

        let err = client()
            .fetch_identity(&server.url(), "gho_revoked")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::ExchangeFailed(_)));
    }

    #[tokio::test]
    async fn test_fetch_identity_missing_id() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/user")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"login": "ghost"}"#)
            .create_async()
            .await;

        let err = client()
            .fetch_identity(&server.url(), "gho_issued")
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::IdentityUnresolved);
    }

    #[tokio::test]
    async fn test_fetch_identity_missing_login() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/user")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 583231, "login": ""}"#)
            .create_async()
            .await;

        let err = client()
            .fetch_identity(&server.url(), "gho_issued")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::IdentityUnresolved);

        let _mock = server
            .mock("GET", "/user")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 583231}"#)
            .create_async()
            .await;

        let err = client()
            .fetch_identity(&server.url(), "gho_issued")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::IdentityUnresolved);
    }
}
