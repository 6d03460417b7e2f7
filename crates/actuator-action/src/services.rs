//! Shared services built once from configuration and handed to both
//! processors.

use std::sync::Arc;
use std::time::Duration;

use actuator_core::config::ActuatorConfig;
use actuator_http::{
    CachedSecrets, CredentialCache, EnvSecrets, HttpClient, HttpClientConfig, OAuthClient,
    SecretsProvider,
};
use actuator_messaging::OutcomePublisher;
use actuator_storage::{MessageRepository, ResultRepository};

use crate::auth::Authenticator;
use crate::catalog::CourseCatalog;
use crate::claims::{ClaimsVerifier, JwksVerifier};
use crate::error::ActionError;
use crate::handler::{
    BookTeeTimeHandler, FetchReservationsHandler, HandlerRegistry, NotificationHandler,
    ReservationClient, SearchTeeTimesHandler, WeatherHandler,
};
use crate::notifier::NotificationProcessor;
use crate::ntfy::NtfyClient;
use crate::orchestrator::WebActionProcessor;

/// Environment variable prefix read by the default secrets provider.
pub const SECRETS_ENV_PREFIX: &str = "ACTUATOR";

/// Everything the processors share. Cloning is cheap.
#[derive(Clone)]
pub struct Services {
    pub config: Arc<ActuatorConfig>,
    pub http: Arc<HttpClient>,
    pub oauth: Arc<OAuthClient>,
    pub authenticator: Arc<Authenticator>,
    pub ntfy: Arc<NtfyClient>,
    pub reservations: Arc<ReservationClient>,
    pub registry: Arc<HandlerRegistry>,
}

impl Services {
    /// Build with environment-backed secrets and a JWKS claims verifier.
    pub fn from_config(config: ActuatorConfig, catalog: CourseCatalog) -> Result<Self, ActionError> {
        let secrets = default_secrets(&config);
        let http = Arc::new(HttpClient::new(HttpClientConfig::from(&config.http))?);
        let verifier: Arc<dyn ClaimsVerifier> = Arc::new(JwksVerifier::new(http.clone()));
        Self::build(config, catalog, http, secrets, verifier)
    }

    pub fn build(
        config: ActuatorConfig,
        catalog: CourseCatalog,
        http: Arc<HttpClient>,
        secrets: Arc<dyn SecretsProvider>,
        verifier: Arc<dyn ClaimsVerifier>,
    ) -> Result<Self, ActionError> {
        config.validate()?;

        let oauth = Arc::new(OAuthClient::new(
            http.clone(),
            secrets.clone(),
            Arc::new(CredentialCache::new()),
        ));
        let authenticator = Arc::new(Authenticator::new(oauth.clone(), secrets));
        let ntfy = Arc::new(NtfyClient::new(http.clone(), &config.notification));
        let reservations = Arc::new(ReservationClient::new(
            http.clone(),
            oauth.clone(),
            verifier,
            Arc::new(catalog),
            config.credentials.secret_name.clone(),
        ));

        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(
            WeatherHandler::new(http.clone()).with_authenticator(authenticator.clone()),
        ))?;
        registry.register(Arc::new(FetchReservationsHandler::new(reservations.clone())))?;
        registry.register(Arc::new(SearchTeeTimesHandler::new(reservations.clone())))?;
        registry.register(Arc::new(BookTeeTimeHandler::new(reservations.clone())))?;
        registry.register(Arc::new(
            NotificationHandler::new(ntfy.clone()).with_authenticator(authenticator.clone()),
        ))?;
        tracing::info!(handlers = ?registry.list_handlers(), "Action handlers registered");

        Ok(Self {
            config: Arc::new(config),
            http,
            oauth,
            authenticator,
            ntfy,
            reservations,
            registry: Arc::new(registry),
        })
    }

    pub fn web_action_processor(
        &self,
        messages: Arc<dyn MessageRepository>,
        results: Arc<dyn ResultRepository>,
        publisher: Arc<OutcomePublisher>,
    ) -> WebActionProcessor {
        WebActionProcessor::new(self.registry.clone(), messages, results, publisher)
    }

    pub fn notification_processor(&self, messages: Arc<dyn MessageRepository>) -> NotificationProcessor {
        NotificationProcessor::new(self.ntfy.clone(), messages, self.config.general.stage)
    }
}

/// Environment secrets behind a TTL cache.
pub fn default_secrets(config: &ActuatorConfig) -> Arc<dyn SecretsProvider> {
    Arc::new(CachedSecrets::new(
        EnvSecrets::new(SECRETS_ENV_PREFIX),
        Duration::from_secs(config.credentials.secret_cache_ttl_secs),
    ))
}
