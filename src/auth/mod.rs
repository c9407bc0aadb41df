//! Bearer-token identity resolution against the auth provider.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Bearer token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Auth provider request failed: {0}")]
    Transport(String),
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Resolves a bearer credential to a user.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<AuthUser, AuthError>;
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingToken)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Resolves users through the provider's `GET /auth/v1/user` endpoint.
pub struct HttpIdentityResolver {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl HttpIdentityResolver {
    pub fn new(client: reqwest::Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<AuthUser, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            debug!("Auth provider rejected token ({})", status);
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Auth provider returned {}: {}", status, body);
            return Err(AuthError::Transport(format!("status {}", status)));
        }

        response
            .json::<AuthUser>()
            .await
            .map_err(|e| AuthError::Transport(format!("malformed user response: {}", e)))
    }
}
