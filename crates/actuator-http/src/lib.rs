//! Actuator HTTP crate: hardened outbound client with bounded retries,
//! header redaction, secrets resolution, and a cached OAuth password grant.

pub mod client;
pub mod credentials;
pub mod error;
pub mod oauth;
pub mod redact;
pub mod retry;
pub mod secrets;

pub use client::{HttpClient, HttpClientConfig, HttpResponse, RequestBody, RequestConfig};
pub use credentials::{CredentialCache, SAFETY_MARGIN_SECS};
pub use error::HttpError;
pub use oauth::{api_key_header, bearer_header, OAuthClient, TokenRequest};
pub use retry::{run_with_retry, RetryPolicy};
pub use secrets::{
    password_credentials, CachedSecrets, EnvSecrets, PasswordCredentials, SecretsError,
    SecretsProvider, StaticSecrets,
};
pub use tokio_util::sync::CancellationToken;
