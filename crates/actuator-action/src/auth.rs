//! Turns a payload's auth descriptor into request headers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use actuator_http::{
    api_key_header, bearer_header, OAuthClient, SecretsError, SecretsProvider, TokenRequest,
};

use crate::error::ActionError;
use crate::types::{AuthConfig, AuthType};

/// Entry in `AuthConfig::headers` naming the header the API key is sent in.
/// It is consumed here and never sent itself.
const API_KEY_HEADER_NAME: &str = "api_key_header";

pub struct Authenticator {
    oauth: Arc<OAuthClient>,
    secrets: Arc<dyn SecretsProvider>,
}

impl Authenticator {
    pub fn new(oauth: Arc<OAuthClient>, secrets: Arc<dyn SecretsProvider>) -> Self {
        Self { oauth, secrets }
    }

    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }

    /// Headers to attach to a request described by `auth`. Static headers
    /// from the descriptor come first, then the credential header.
    pub async fn headers(
        &self,
        cancel: &CancellationToken,
        auth: Option<&AuthConfig>,
    ) -> Result<Vec<(String, String)>, ActionError> {
        let Some(auth) = auth else {
            return Ok(Vec::new());
        };
        auth.validate()?;

        let mut headers: Vec<(String, String)> = auth
            .headers
            .iter()
            .filter(|(name, _)| name.as_str() != API_KEY_HEADER_NAME)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.sort();

        let secret_name = auth.secret_name.as_deref().unwrap_or_default();
        match auth.auth_type {
            AuthType::None => {}
            AuthType::OauthPassword => {
                let token_url = auth.token_url.clone().ok_or_else(|| {
                    ActionError::InvalidPayload("token_url is required for oauth_password".into())
                })?;
                let token = self
                    .oauth
                    .password_grant(
                        cancel,
                        &TokenRequest {
                            token_url,
                            secret_name: secret_name.to_string(),
                            scope: auth.scope.clone(),
                            headers: Vec::new(),
                        },
                    )
                    .await?;
                headers.push(bearer_header(&token));
            }
            AuthType::ApiKey => {
                let key = self.secret_field(secret_name, &["api_key", "key"]).await?;
                let name = auth.headers.get(API_KEY_HEADER_NAME).map(String::as_str);
                headers.push(api_key_header(name, &key));
            }
            AuthType::Bearer => {
                let token = self.secret_field(secret_name, &["token", "access_token"]).await?;
                headers.push(bearer_header(&token));
            }
        }
        debug!(auth_type = %auth.auth_type, header_count = headers.len(), "Resolved auth headers");
        Ok(headers)
    }

    async fn secret_field(&self, name: &str, fields: &[&str]) -> Result<String, ActionError> {
        let mut secret = self.secrets.get_secret(name).await?;
        fields
            .iter()
            .find_map(|field| secret.remove(*field).filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                ActionError::Secrets(SecretsError::MissingField {
                    name: name.to_string(),
                    field: fields.join("|"),
                })
            })
    }
}
