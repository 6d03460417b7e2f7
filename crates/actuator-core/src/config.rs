use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ActuatorError, Result};
use crate::types::Stage;

/// Top-level configuration for the Actuator pipeline.
///
/// Each section corresponds to one collaborator or cross-cutting concern.
/// Everything has a default so a partial file is always usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActuatorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub topics: TopicsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub consumer: ConsumerConfig,
}

impl ActuatorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ActuatorConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would make the pipeline misbehave at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.http.max_attempts == 0 {
            return Err(ActuatorError::Config(
                "http.max_attempts must be at least 1".into(),
            ));
        }
        if self.consumer.max_concurrency == 0 {
            return Err(ActuatorError::Config(
                "consumer.max_concurrency must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("topics.web_actions", &self.topics.web_actions),
            ("topics.notifications", &self.topics.notifications),
            ("topics.agent_response", &self.topics.agent_response),
            ("topics.schedule_creation", &self.topics.schedule_creation),
        ] {
            if value.trim().is_empty() {
                return Err(ActuatorError::Config(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Deployment stage stamped on every message this process creates.
    pub stage: Stage,
    /// Log level: debug, info, warn, error. `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            stage: Stage::Dev,
            log_level: "info".to_string(),
        }
    }
}

/// Logical pub/sub topic names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    pub web_actions: String,
    pub notifications: String,
    pub agent_response: String,
    pub schedule_creation: String,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            web_actions: "web-actions".to_string(),
            notifications: "notifications".to_string(),
            agent_response: "agent-response".to_string(),
            schedule_creation: "schedule-creation".to_string(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub messages_table: String,
    pub results_table: String,
    /// SQLite file used by the durable store.
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            messages_table: "messages".to_string(),
            results_table: "action_results".to_string(),
            database_path: "data/actuator.db".to_string(),
        }
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub pool_idle_timeout_secs: u64,
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later attempt.
    pub initial_backoff_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            pool_idle_timeout_secs: 90,
            max_attempts: 3,
            initial_backoff_ms: 1000,
            user_agent: "actuator/1.0".to_string(),
        }
    }
}

/// Push notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub ntfy_url: String,
    /// Prefix for notification titles; the stage is appended.
    pub title_prefix: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ntfy_url: "https://ntfy.sh/actuator-alerts".to_string(),
            title_prefix: "Actuator".to_string(),
        }
    }
}

/// Credential lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Secret holding the reservation-site login.
    pub secret_name: String,
    /// How long resolved secrets are cached, in seconds.
    pub secret_cache_ttl_secs: u64,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            secret_name: "actuator/reservations/credentials".to_string(),
            secret_cache_ttl_secs: 300,
        }
    }
}

/// Batch consumer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Messages of one batch processed at the same time.
    pub max_concurrency: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self { max_concurrency: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ActuatorConfig::default();
        assert_eq!(config.general.stage, Stage::Dev);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.http.max_attempts, 3);
        assert_eq!(config.http.initial_backoff_ms, 1000);
        assert_eq!(config.topics.agent_response, "agent-response");
        assert_eq!(config.consumer.max_concurrency, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[general]
stage = "prod"
log_level = "debug"

[topics]
web_actions = "prod-web-actions"

[http]
max_attempts = 5
initial_backoff_ms = 250

[notification]
ntfy_url = "https://ntfy.example.com/alerts"
"#,
        )
        .unwrap();

        let config = ActuatorConfig::load(&path).unwrap();
        assert_eq!(config.general.stage, Stage::Prod);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.topics.web_actions, "prod-web-actions");
        assert_eq!(config.topics.notifications, "notifications");
        assert_eq!(config.http.max_attempts, 5);
        assert_eq!(config.http.initial_backoff_ms, 250);
        assert_eq!(config.http.request_timeout_secs, 30);
        assert_eq!(config.notification.ntfy_url, "https://ntfy.example.com/alerts");
    }

    #[test]
    fn test_load_rejects_zero_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http]\nmax_attempts = 0\n").unwrap();
        let err = ActuatorConfig::load(&path).unwrap_err();
        assert!(matches!(err, ActuatorError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_empty_topic() {
        let mut config = ActuatorConfig::default();
        config.topics.schedule_creation = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ActuatorConfig::load_or_default(Path::new("/nonexistent/actuator.toml"));
        assert_eq!(config.http.max_attempts, 3);
    }

    #[test]
    fn test_load_or_default_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not [ toml").unwrap();
        let config = ActuatorConfig::load_or_default(&path);
        assert_eq!(config.general.stage, Stage::Dev);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = ActuatorConfig::default();
        config.general.stage = Stage::Stage;
        config.consumer.max_concurrency = 4;
        config.save(&path).unwrap();

        let loaded = ActuatorConfig::load(&path).unwrap();
        assert_eq!(loaded.general.stage, Stage::Stage);
        assert_eq!(loaded.consumer.max_concurrency, 4);
    }
}
