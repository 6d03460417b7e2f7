//! Notification action handler.
//!
//! Delivers the `message` argument as a push notification.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use actuator_core::types::ActionType;

use crate::auth::Authenticator;
use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::ntfy::NtfyClient;
use crate::types::ActionPayload;

pub struct NotificationHandler {
    ntfy: Arc<NtfyClient>,
    auth: Option<Arc<Authenticator>>,
}

impl NotificationHandler {
    pub fn new(ntfy: Arc<NtfyClient>) -> Self {
        Self { ntfy, auth: None }
    }

    pub fn with_authenticator(mut self, auth: Arc<Authenticator>) -> Self {
        self.auth = Some(auth);
        self
    }
}

#[async_trait]
impl ActionHandler for NotificationHandler {
    fn action_type(&self) -> ActionType {
        ActionType::SendNotification
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        arguments: &Map<String, Value>,
        payload: &ActionPayload,
    ) -> Result<Vec<String>, ActionError> {
        let text = arguments
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| payload.argument_str("message"))
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ActionError::InvalidPayload("notification message must not be empty".into())
            })?;

        let title = arguments
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.ntfy.title(""));
        let url = if payload.url.trim().is_empty() {
            self.ntfy.url()
        } else {
            payload.url.as_str()
        };

        let headers = match (&payload.auth_config, &self.auth) {
            (None, _) => Vec::new(),
            (Some(config), Some(auth)) => auth.headers(cancel, Some(config)).await?,
            (Some(_), None) => {
                return Err(ActionError::Config(
                    "notification handler has no authenticator".into(),
                ))
            }
        };

        self.ntfy.send_to(cancel, url, &title, text, headers).await?;
        tracing::info!(url = %url, title = %title, "Notification action delivered");
        Ok(vec![text.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actuator_core::config::NotificationConfig;
    use actuator_http::{HttpClient, HttpClientConfig, RetryPolicy};
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handler(ntfy_url: String) -> NotificationHandler {
        let http = HttpClient::new(HttpClientConfig {
            retry: RetryPolicy::single_attempt(),
            ..HttpClientConfig::default()
        })
        .unwrap();
        let ntfy = NtfyClient::new(
            Arc::new(http),
            &NotificationConfig {
                ntfy_url,
                title_prefix: "Actuator".into(),
            },
        );
        NotificationHandler::new(Arc::new(ntfy))
    }

    fn args(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_sends_message_argument() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/alerts"))
            .and(header("Title", "Tee time"))
            .and(body_string("Booked for 7:30"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let handler = handler(format!("{}/alerts", server.uri()));
        let payload = ActionPayload::new(ActionType::SendNotification, "");
        let out = handler
            .execute(
                &CancellationToken::new(),
                &args(json!({"message": "Booked for 7:30", "title": "Tee time"})),
                &payload,
            )
            .await
            .unwrap();
        assert_eq!(out, vec!["Booked for 7:30".to_string()]);
    }

    #[tokio::test]
    async fn test_payload_url_and_payload_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/other-topic"))
            .and(header("Title", "Actuator"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let handler = handler("http://127.0.0.1:9/unused".into());
        let mut payload = ActionPayload::new(
            ActionType::SendNotification,
            format!("{}/other-topic", server.uri()),
        );
        payload.arguments.insert("message".into(), json!("from payload"));
        let out = handler
            .execute(&CancellationToken::new(), &Map::new(), &payload)
            .await
            .unwrap();
        assert_eq!(out, vec!["from payload".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_message() {
        let handler = handler("http://127.0.0.1:9/alerts".into());
        let payload = ActionPayload::new(ActionType::SendNotification, "");
        let err = handler
            .execute(&CancellationToken::new(), &args(json!({"title": "x"})), &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidPayload(_)));
    }

    #[test]
    fn test_action_type() {
        let handler = handler("http://127.0.0.1:9/alerts".into());
        assert_eq!(handler.action_type(), ActionType::SendNotification);
    }
}
