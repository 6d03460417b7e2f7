//! OAuth 2.0 resource-owner password grant backed by the credential cache.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::HttpClient;
use crate::credentials::CredentialCache;
use crate::error::HttpError;
use crate::secrets::{password_credentials, SecretsProvider};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Where and how to obtain a token.
#[derive(Debug, Clone, Default)]
pub struct TokenRequest {
    pub token_url: String,
    pub secret_name: String,
    pub scope: Option<String>,
    /// Extra headers some identity providers insist on (client-id, origin).
    pub headers: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: i64,
}

/// Fetches and caches bearer tokens.
pub struct OAuthClient {
    http: Arc<HttpClient>,
    secrets: Arc<dyn SecretsProvider>,
    cache: Arc<CredentialCache>,
}

impl OAuthClient {
    pub fn new(
        http: Arc<HttpClient>,
        secrets: Arc<dyn SecretsProvider>,
        cache: Arc<CredentialCache>,
    ) -> Self {
        Self {
            http,
            secrets,
            cache,
        }
    }

    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    /// Return a valid access token, fetching a new one when the cached
    /// entry is missing or inside its safety margin.
    pub async fn password_grant(
        &self,
        cancel: &CancellationToken,
        request: &TokenRequest,
    ) -> Result<String, HttpError> {
        if request.token_url.is_empty() || request.secret_name.is_empty() {
            return Err(HttpError::InvalidRequest(
                "token_url and secret_name are required".into(),
            ));
        }

        let key = CredentialCache::cache_key(&request.token_url, &request.secret_name);
        if let Some(token) = self.cache.get(&key) {
            debug!(token_url = %request.token_url, "using cached access token");
            return Ok(token);
        }

        let creds = password_credentials(self.secrets.as_ref(), &request.secret_name).await?;

        let mut fields = vec![
            ("grant_type".to_string(), "password".to_string()),
            ("username".to_string(), creds.username.clone()),
            ("password".to_string(), creds.password.clone()),
        ];
        if let Some(client_id) = &creds.client_id {
            fields.push(("client_id".to_string(), client_id.clone()));
        }
        if let Some(client_secret) = &creds.client_secret {
            fields.push(("client_secret".to_string(), client_secret.clone()));
        }
        if let Some(scope) = request.scope.as_deref().filter(|s| !s.is_empty()) {
            fields.push(("scope".to_string(), scope.to_string()));
        }

        let response = self
            .http
            .form_post(cancel, &request.token_url, fields, request.headers.clone())
            .await?;

        let token: TokenResponse = response
            .json()
            .map_err(|_| HttpError::Token("token response is not valid JSON".into()))?;
        if token.access_token.is_empty() {
            return Err(HttpError::Token("no access_token in response".into()));
        }

        let ttl = if token.expires_in > 0 {
            token.expires_in
        } else {
            DEFAULT_TOKEN_TTL_SECS
        };
        self.cache.put(&key, &token.access_token, ttl);

        info!(
            token_url = %request.token_url,
            token_type = %token.token_type,
            expires_in = ttl,
            "access token obtained"
        );
        Ok(token.access_token)
    }
}

/// `Authorization: Bearer <token>` header pair.
pub fn bearer_header(token: &str) -> (String, String) {
    ("Authorization".to_string(), format!("Bearer {}", token))
}

/// API key header pair; defaults to `X-API-Key`.
pub fn api_key_header(name: Option<&str>, key: &str) -> (String, String) {
    (
        name.filter(|n| !n.is_empty()).unwrap_or("X-API-Key").to_string(),
        key.to_string(),
    )
}
