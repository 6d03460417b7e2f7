//! Push notification delivery through an ntfy topic.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use actuator_core::config::NotificationConfig;
use actuator_http::{HttpClient, RequestConfig};

use crate::error::ActionError;

/// Posts plain-text notifications to one ntfy topic URL.
pub struct NtfyClient {
    http: Arc<HttpClient>,
    url: String,
    title_prefix: String,
}

impl NtfyClient {
    pub fn new(http: Arc<HttpClient>, config: &NotificationConfig) -> Self {
        Self {
            http,
            url: config.ntfy_url.clone(),
            title_prefix: config.title_prefix.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Title of the form `"<prefix> - <suffix>"`.
    pub fn title(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.title_prefix.clone()
        } else {
            format!("{} - {}", self.title_prefix, suffix)
        }
    }

    pub async fn send(
        &self,
        cancel: &CancellationToken,
        title: &str,
        text: &str,
    ) -> Result<(), ActionError> {
        self.send_to(cancel, &self.url, title, text, Vec::new()).await
    }

    /// Send to an explicit topic URL instead of the configured one.
    pub async fn send_to(
        &self,
        cancel: &CancellationToken,
        url: &str,
        title: &str,
        text: &str,
        headers: Vec<(String, String)>,
    ) -> Result<(), ActionError> {
        if text.trim().is_empty() {
            return Err(ActionError::InvalidPayload(
                "notification text is empty".into(),
            ));
        }
        let mut request = RequestConfig::post(url).headers(headers).text(text);
        if !title.is_empty() {
            request = request.header("Title", title);
        }
        let response = self.http.execute(cancel, request).await?;
        info!(url = %url, status_code = response.status, "Notification sent");
        Ok(())
    }
}
