//! Notification processor: delivers notification-topic messages through ntfy.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use actuator_core::message::Message;
use actuator_core::types::{MessageStatus, MessageType, Stage};
use actuator_messaging::MessageProcessor;
use actuator_storage::MessageRepository;

use crate::error::ActionError;
use crate::ntfy::NtfyClient;
use crate::persist::BestEffortStore;

pub struct NotificationProcessor {
    ntfy: Arc<NtfyClient>,
    store: BestEffortStore,
    stage: Stage,
}

impl NotificationProcessor {
    pub fn new(ntfy: Arc<NtfyClient>, messages: Arc<dyn MessageRepository>, stage: Stage) -> Self {
        Self {
            ntfy,
            store: BestEffortStore::messages_only(messages),
            stage,
        }
    }

    pub fn persistence_failures(&self) -> usize {
        self.store.failures()
    }

    fn text_of(message: &Message) -> Result<String, ActionError> {
        match message.message_type {
            MessageType::Notify | MessageType::Scheduled | MessageType::HelloWorld => {}
            other => {
                return Err(ActionError::InvalidPayload(format!(
                    "{} messages are not notifications",
                    other
                )))
            }
        }
        message
            .payload_text()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ActionError::InvalidPayload("notification has no text".into()))
    }
}

#[async_trait]
impl MessageProcessor for NotificationProcessor {
    type Error = ActionError;

    async fn process(&self, cancel: &CancellationToken, mut message: Message) -> Result<(), ActionError> {
        if message.status == MessageStatus::Completed {
            info!(message_id = %message.id, "Notification already delivered, skipping");
            return Ok(());
        }
        if message.status != MessageStatus::Processing {
            message.mark_processing()?;
        }
        self.store.update_status(&message, "mark processing").await;

        let title = self.ntfy.title(&self.stage.to_string());
        let sent = match Self::text_of(&message) {
            Ok(text) => self.ntfy.send(cancel, &title, &text).await,
            Err(e) => Err(e),
        };

        match sent {
            Ok(()) => {
                if let Err(e) = message.mark_completed() {
                    warn!(message_id = %message.id, error = %e, "Could not mark notification completed");
                } else {
                    self.store.update_status(&message, "mark completed").await;
                }
                info!(message_id = %message.id, "Notification processed");
                Ok(())
            }
            Err(e) => {
                if let Err(transition) = message.mark_failed(e.to_string()) {
                    warn!(message_id = %message.id, error = %transition, "Could not mark notification failed");
                } else {
                    self.store.update_status(&message, "mark failed").await;
                }
                if e.is_permanent() {
                    warn!(message_id = %message.id, error = %e, "Dropping undeliverable notification");
                    Ok(())
                } else {
                    error!(message_id = %message.id, error = %e, "Notification delivery failed");
                    Err(e)
                }
            }
        }
    }
}
