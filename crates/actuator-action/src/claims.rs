//! Identity claims carried by reservation-site access tokens.
//!
//! [`JwksVerifier`] checks the token signature against the site's published
//! RSA keys before any claim is trusted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use actuator_http::{HttpClient, RequestConfig};

use crate::error::ActionError;

/// How long fetched signing keys are reused.
pub const DEFAULT_JWKS_REFRESH: Duration = Duration::from_secs(3600);

/// Golfer identity extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityClaims {
    #[serde(rename = "golferId", deserialize_with = "string_or_number")]
    pub golfer_id: String,
    #[serde(default)]
    pub acct: String,
    #[serde(default)]
    pub email: String,
}

impl IdentityClaims {
    /// Numeric golfer id, as the booking endpoints expect it.
    pub fn golfer_id_number(&self) -> Result<i64, ActionError> {
        self.golfer_id
            .parse()
            .map_err(|_| ActionError::Auth(format!("golferId is not numeric: {}", self.golfer_id)))
    }
}

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Verifies an access token and returns its identity claims.
#[async_trait]
pub trait ClaimsVerifier: Send + Sync {
    async fn verify(
        &self,
        cancel: &CancellationToken,
        token: &str,
        jwks_url: &str,
    ) -> Result<IdentityClaims, ActionError>;
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    #[serde(default)]
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kty: String,
    #[serde(default)]
    kid: Option<String>,
    #[serde(rename = "use", default)]
    key_use: Option<String>,
    #[serde(default)]
    alg: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

struct KeySet {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

/// RS256 verifier backed by a JWKS endpoint, with per-URL key caching.
pub struct JwksVerifier {
    http: std::sync::Arc<HttpClient>,
    cache: RwLock<HashMap<String, KeySet>>,
    refresh_interval: Duration,
}

impl JwksVerifier {
    pub fn new(http: std::sync::Arc<HttpClient>) -> Self {
        Self {
            http,
            cache: RwLock::new(HashMap::new()),
            refresh_interval: DEFAULT_JWKS_REFRESH,
        }
    }

    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    async fn key_for(
        &self,
        cancel: &CancellationToken,
        jwks_url: &str,
        kid: &str,
    ) -> Result<DecodingKey, ActionError> {
        {
            let cache = self.cache.read().await;
            if let Some(set) = cache.get(jwks_url) {
                if set.fetched_at.elapsed() < self.refresh_interval {
                    if let Some(key) = set.keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        // Unknown kid or stale set: the site may have rotated keys.
        let keys = self.fetch_keys(cancel, jwks_url).await?;
        let key = keys.get(kid).cloned();
        self.cache.write().await.insert(
            jwks_url.to_string(),
            KeySet {
                keys,
                fetched_at: Instant::now(),
            },
        );
        key.ok_or_else(|| ActionError::Auth(format!("no signing key with kid '{}'", kid)))
    }

    async fn fetch_keys(
        &self,
        cancel: &CancellationToken,
        jwks_url: &str,
    ) -> Result<HashMap<String, DecodingKey>, ActionError> {
        debug!(url = %jwks_url, "Fetching JWKS keys");
        let response = self
            .http
            .execute(
                cancel,
                RequestConfig::get(jwks_url).header("Accept", "application/json"),
            )
            .await?;
        let jwks: JwksResponse = response
            .json()
            .map_err(|e| ActionError::Auth(format!("invalid JWKS response: {}", e)))?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            if jwk.kty != "RSA" {
                continue;
            }
            if jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
                continue;
            }
            if jwk.alg.as_deref().is_some_and(|a| a != "RS256") {
                warn!(kid = ?jwk.kid, alg = ?jwk.alg, "Skipping JWKS key with unsupported algorithm");
                continue;
            }
            let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
                continue;
            };
            match DecodingKey::from_rsa_components(&n, &e) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(err) => warn!(kid = %kid, error = %err, "Failed to parse JWKS key components"),
            }
        }

        if keys.is_empty() {
            warn!(url = %jwks_url, "No usable RSA signing keys in JWKS response");
        }
        Ok(keys)
    }
}

#[async_trait]
impl ClaimsVerifier for JwksVerifier {
    async fn verify(
        &self,
        cancel: &CancellationToken,
        token: &str,
        jwks_url: &str,
    ) -> Result<IdentityClaims, ActionError> {
        let header =
            decode_header(token).map_err(|e| ActionError::Auth(format!("malformed token: {}", e)))?;
        if header.alg != Algorithm::RS256 {
            return Err(ActionError::Auth(format!(
                "unsupported token algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| ActionError::Auth("token header has no kid".into()))?;

        let key = self.key_for(cancel, jwks_url, &kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.validate_aud = false;

        let data = decode::<IdentityClaims>(token, &key, &validation).map_err(|e| {
            warn!(error = %e, "Token verification failed");
            ActionError::Auth(format!("token verification failed: {}", e))
        })?;
        debug!(golfer_id = %data.claims.golfer_id, "Token verified");
        Ok(data.claims)
    }
}
