//! Named credential bundles.
//!
//! A secret is a flat string map (`username`, `password`, `client_id`, ...).
//! [`CachedSecrets`] keeps resolved bundles for a fixed time so repeated
//! token fetches do not hit the backing store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

/// Errors from secret resolution.
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("Secret not found: {0}")]
    NotFound(String),
    #[error("Secret {name} is malformed: {reason}")]
    Malformed { name: String, reason: String },
    #[error("Secret {name} is missing field {field}")]
    MissingField { name: String, field: String },
}

/// Source of named secrets.
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>, SecretsError>;
}

/// Login used by the OAuth password grant.
#[derive(Clone)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .field("password", &crate::redact::REDACTED)
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Resolve `name` and require `username` and `password`.
pub async fn password_credentials(
    provider: &dyn SecretsProvider,
    name: &str,
) -> Result<PasswordCredentials, SecretsError> {
    let mut secret = provider.get_secret(name).await?;
    let mut required = |field: &str| {
        secret
            .remove(field)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SecretsError::MissingField {
                name: name.to_string(),
                field: field.to_string(),
            })
    };
    let username = required("username")?;
    let password = required("password")?;
    Ok(PasswordCredentials {
        username,
        password,
        client_id: secret.remove("client_id").filter(|v| !v.is_empty()),
        client_secret: secret.remove("client_secret").filter(|v| !v.is_empty()),
    })
}

// =============================================================================
// Providers
// =============================================================================

/// In-memory secrets, mostly for wiring and tests.
#[derive(Debug, Default)]
pub struct StaticSecrets {
    secrets: HashMap<String, HashMap<String, String>>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret<I, K, V>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.secrets.insert(
            name.into(),
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

#[async_trait]
impl SecretsProvider for StaticSecrets {
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>, SecretsError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretsError::NotFound(name.to_string()))
    }
}

/// Secrets stored as JSON objects in environment variables.
///
/// `reservations/prod` is read from `<PREFIX>_RESERVATIONS_PROD`.
#[derive(Debug, Clone)]
pub struct EnvSecrets {
    prefix: String,
}

impl EnvSecrets {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_name(&self, name: &str) -> String {
        let normalized: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        if self.prefix.is_empty() {
            normalized
        } else {
            format!("{}_{}", self.prefix, normalized)
        }
    }
}

#[async_trait]
impl SecretsProvider for EnvSecrets {
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>, SecretsError> {
        let var = self.variable_name(name);
        let raw = std::env::var(&var).map_err(|_| SecretsError::NotFound(name.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| SecretsError::Malformed {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Time-bounded cache in front of another provider.
pub struct CachedSecrets<P> {
    inner: P,
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, HashMap<String, String>)>>,
}

impl<P: SecretsProvider> CachedSecrets<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl<P: SecretsProvider> SecretsProvider for CachedSecrets<P> {
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>, SecretsError> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((fetched_at, value)) = entries.get(name) {
                if fetched_at.elapsed() < self.ttl {
                    debug!(secret = %name, "secret cache hit");
                    return Ok(value.clone());
                }
            }
        }

        let value = self.inner.get_secret(name).await?;
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), (Instant::now(), value.clone()));
        debug!(secret = %name, "secret fetched and cached");
        Ok(value)
    }
}
