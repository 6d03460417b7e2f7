//! Web-action processing: one message in, one result and N outcomes out.
//!
//! Per message the steps run strictly in order: validate, persist
//! `processing`, parse the payload, create the result, execute the handler,
//! finalize the result, persist the terminal status, publish outcomes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use actuator_core::message::Message;
use actuator_core::result::ActionResult;
use actuator_core::types::{MessageStatus, MessageType};
use actuator_messaging::{MessageProcessor, OutcomePublisher};
use actuator_storage::{MessageRepository, ResultRepository};

use crate::error::ActionError;
use crate::handler::HandlerRegistry;
use crate::persist::BestEffortStore;
use crate::types::ActionPayload;

/// Originator stamped on outcome messages.
pub const OUTCOME_ORIGINATOR: &str = "web-action-processor";

/// Status code recorded on a successful result.
const SUCCESS_CODE: u16 = 200;

pub struct WebActionProcessor {
    registry: Arc<HandlerRegistry>,
    store: BestEffortStore,
    publisher: Arc<OutcomePublisher>,
}

impl WebActionProcessor {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        messages: Arc<dyn MessageRepository>,
        results: Arc<dyn ResultRepository>,
        publisher: Arc<OutcomePublisher>,
    ) -> Self {
        Self {
            registry,
            store: BestEffortStore::new(messages, results),
            publisher,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Persistence writes that failed and were logged instead of raised.
    pub fn persistence_failures(&self) -> usize {
        self.store.failures()
    }

    fn parse_payload(message: &Message) -> Result<ActionPayload, ActionError> {
        if message.message_type != MessageType::WebAction {
            return Err(ActionError::InvalidPayload(format!(
                "expected a web_action message, got {}",
                message.message_type
            )));
        }
        message
            .validate()
            .map_err(|e| ActionError::InvalidPayload(e.to_string()))?;
        ActionPayload::from_value(&message.payload)
    }

    /// Record the failure on the result and the message. Permanent errors
    /// are acknowledged so the queue does not redeliver them.
    async fn fail(
        &self,
        message: &mut Message,
        result: Option<&mut ActionResult>,
        err: ActionError,
        elapsed: Duration,
    ) -> Result<(), ActionError> {
        let reason = err.to_string();

        if let Some(result) = result {
            match result.mark_failure(reason.clone(), elapsed) {
                Ok(()) => self.store.save_result(result, "record failure").await,
                Err(e) => warn!(message_id = %message.id, error = %e, "Result already finalized"),
            }
        }

        match message.mark_failed(reason.clone()) {
            Ok(()) => self.store.update_status(message, "mark failed").await,
            Err(e) => warn!(message_id = %message.id, error = %e, "Could not mark message failed"),
        }

        if err.is_permanent() {
            warn!(
                message_id = %message.id,
                error = %reason,
                "Web action failed permanently, not retrying"
            );
            Ok(())
        } else {
            error!(
                message_id = %message.id,
                retry_count = message.retry_count,
                error = %reason,
                "Web action failed"
            );
            Err(err)
        }
    }

    async fn complete(
        &self,
        message: &mut Message,
        result: &mut ActionResult,
        outcomes: Vec<String>,
        elapsed: Duration,
    ) {
        match result.mark_success(SUCCESS_CODE, &outcomes.join("\n"), elapsed) {
            Ok(()) => self.store.save_result(result, "record success").await,
            Err(e) => warn!(message_id = %message.id, error = %e, "Result already finalized"),
        }

        match message.mark_completed() {
            Ok(()) => self.store.update_status(message, "mark completed").await,
            Err(e) => warn!(message_id = %message.id, error = %e, "Could not mark message completed"),
        }

        info!(
            message_id = %message.id,
            action = %result.action,
            outcomes = outcomes.len(),
            duration_ms = elapsed.as_millis() as u64,
            "Web action completed"
        );

        for text in outcomes {
            self.publish_outcome(message, text).await;
        }
    }

    async fn publish_outcome(&self, original: &Message, text: String) {
        let message_type = if original.is_agent_originated() {
            MessageType::AgentResponse
        } else {
            MessageType::Notify
        };
        let mut outcome = Message::new(
            OUTCOME_ORIGINATOR,
            original.stage,
            message_type,
            json!({ "message": text }),
        )
        .with_parent(original.id.clone());
        if let Err(e) = outcome.mark_queued() {
            warn!(message_id = %original.id, error = %e, "Could not queue outcome");
        }

        self.store.save_message(&outcome, "save outcome").await;
        // The publisher logs failures itself; the action already succeeded.
        if self.publisher.publish(&outcome, Some(original)).await.is_err() {
            debug!(
                message_id = %original.id,
                outcome_id = %outcome.id,
                "Outcome left unpublished"
            );
        }
    }
}

#[async_trait]
impl MessageProcessor for WebActionProcessor {
    type Error = ActionError;

    async fn process(&self, cancel: &CancellationToken, mut message: Message) -> Result<(), ActionError> {
        if message.status == MessageStatus::Completed {
            info!(message_id = %message.id, "Message already completed, skipping");
            return Ok(());
        }
        if message.status != MessageStatus::Processing {
            message.mark_processing()?;
        }
        self.store.save_message(&message, "mark processing").await;
        let started = Instant::now();

        let payload = match Self::parse_payload(&message) {
            Ok(payload) => payload,
            Err(e) => return self.fail(&mut message, None, e, started.elapsed()).await,
        };
        debug!(message_id = %message.id, payload = ?payload.redacted(), "Dispatching web action");

        let mut result = ActionResult::new(&message.id, payload.action, &payload.url, message.stage);
        self.store.save_result(&result, "create result").await;

        // Payload arguments win over message arguments.
        let mut arguments = message.arguments.clone();
        arguments.extend(payload.arguments.clone());

        let executed = match self.registry.get_handler(payload.action) {
            Ok(handler) => handler.execute(cancel, &arguments, &payload).await,
            Err(e) => Err(e),
        };

        match executed {
            Ok(outcomes) => {
                self.complete(&mut message, &mut result, outcomes, started.elapsed())
                    .await;
                Ok(())
            }
            Err(e) => {
                self.fail(&mut message, Some(&mut result), e, started.elapsed())
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use actuator_core::config::TopicsConfig;
    use actuator_core::types::{ActionType, ResultStatus, Stage, AGENT_ORIGINATOR};
    use actuator_messaging::InMemoryTransport;
    use actuator_storage::MemoryStore;
    use serde_json::{Map, Value};

    use crate::handler::ActionHandler;

    enum Script {
        Outcomes(Vec<&'static str>),
        Transient,
        Conflict,
    }

    struct Scripted {
        action: ActionType,
        script: Script,
        calls: AtomicUsize,
        seen_arguments: std::sync::Mutex<Option<Map<String, Value>>>,
    }

    impl Scripted {
        fn new(action: ActionType, script: Script) -> Arc<Self> {
            Arc::new(Self {
                action,
                script,
                calls: AtomicUsize::new(0),
                seen_arguments: std::sync::Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl ActionHandler for Scripted {
        fn action_type(&self) -> ActionType {
            self.action
        }

        async fn execute(
            &self,
            _cancel: &CancellationToken,
            arguments: &Map<String, Value>,
            _payload: &ActionPayload,
        ) -> Result<Vec<String>, ActionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_arguments.lock().unwrap() = Some(arguments.clone());
            match &self.script {
                Script::Outcomes(out) => Ok(out.iter().map(|s| s.to_string()).collect()),
                Script::Transient => Err(ActionError::Execution("upstream returned 503".into())),
                Script::Conflict => Err(ActionError::Conflict("already booked".into())),
            }
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        transport: Arc<InMemoryTransport>,
        processor: WebActionProcessor,
    }

    fn harness(handlers: Vec<Arc<Scripted>>) -> Harness {
        let mut registry = HandlerRegistry::new();
        for handler in handlers {
            registry.register(handler).unwrap();
        }
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(InMemoryTransport::new());
        let publisher = OutcomePublisher::new(transport.clone(), TopicsConfig::default());
        let processor = WebActionProcessor::new(
            Arc::new(registry),
            store.clone(),
            store.clone(),
            Arc::new(publisher),
        );
        Harness {
            store,
            transport,
            processor,
        }
    }

    fn weather_message(created_by: &str) -> Message {
        Message::new(
            created_by,
            Stage::Dev,
            MessageType::WebAction,
            json!({"action": "get_weather", "url": "https://api.weather.gov/x"}),
        )
    }

    // =========================================================================
    // Success
    // =========================================================================

    #[tokio::test]
    async fn test_success_publishes_notifications() {
        let handler = Scripted::new(ActionType::GetWeather, Script::Outcomes(vec!["sunny", "rain"]));
        let h = harness(vec![handler.clone()]);
        let message = weather_message("scheduler");
        let id = message.id.clone();

        h.processor.process(&CancellationToken::new(), message).await.unwrap();

        let stored = h.store.get_message(&id).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Completed);

        let result = h.store.get_result_by_message_id(&id).await.unwrap().unwrap();
        assert_eq!(result.status, ResultStatus::Success);
        assert_eq!(result.response_code, Some(200));
        assert_eq!(result.response_body.as_deref(), Some("sunny\nrain"));

        let published = h.transport.publications_to("notifications");
        assert_eq!(published.len(), 2);
        let outcome = published[0].message().unwrap();
        assert_eq!(outcome.message_type, MessageType::Notify);
        assert_eq!(outcome.created_by, OUTCOME_ORIGINATOR);
        assert_eq!(outcome.parent_id.as_deref(), Some(id.as_str()));
        assert_eq!(outcome.payload_text().as_deref(), Some("sunny"));
        assert_eq!(h.processor.persistence_failures(), 0);
    }

    #[tokio::test]
    async fn test_agent_originated_routes_to_agent() {
        let handler = Scripted::new(ActionType::GetWeather, Script::Outcomes(vec!["sunny"]));
        let h = harness(vec![handler]);

        h.processor
            .process(&CancellationToken::new(), weather_message(AGENT_ORIGINATOR))
            .await
            .unwrap();

        assert!(h.transport.publications_to("notifications").is_empty());
        let published = h.transport.publications_to("agent-response");
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].message().unwrap().message_type,
            MessageType::AgentResponse
        );
    }

    #[tokio::test]
    async fn test_payload_arguments_override_message_arguments() {
        let handler = Scripted::new(ActionType::GetWeather, Script::Outcomes(vec![]));
        let h = harness(vec![handler.clone()]);
        let mut message_args = Map::new();
        message_args.insert("operation".into(), json!("forecast"));
        message_args.insert("units".into(), json!("metric"));
        let message = Message::new(
            "scheduler",
            Stage::Dev,
            MessageType::WebAction,
            json!({
                "action": "get_weather",
                "url": "https://api.weather.gov/x",
                "arguments": {"units": "imperial"}
            }),
        )
        .with_arguments(message_args);

        h.processor.process(&CancellationToken::new(), message).await.unwrap();

        let seen = handler.seen_arguments.lock().unwrap().clone().unwrap();
        assert_eq!(seen["operation"], "forecast");
        assert_eq!(seen["units"], "imperial");
        assert!(h.transport.publications().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_action() {
        let handler = Scripted::new(ActionType::GetWeather, Script::Outcomes(vec!["sunny"]));
        let h = harness(vec![handler]);
        h.transport.set_failing(true);
        let message = weather_message("scheduler");
        let id = message.id.clone();

        h.processor.process(&CancellationToken::new(), message).await.unwrap();

        assert_eq!(
            h.store.get_message(&id).await.unwrap().status,
            MessageStatus::Completed
        );
        // Original plus the saved outcome.
        assert_eq!(h.store.message_count(), 2);
    }

    #[tokio::test]
    async fn test_completed_message_is_skipped() {
        let handler = Scripted::new(ActionType::GetWeather, Script::Outcomes(vec!["sunny"]));
        let h = harness(vec![handler.clone()]);
        let mut message = weather_message("scheduler");
        message.mark_processing().unwrap();
        message.mark_completed().unwrap();

        h.processor.process(&CancellationToken::new(), message).await.unwrap();
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.store.message_count(), 0);
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[tokio::test]
    async fn test_unregistered_action_is_acked() {
        let h = harness(vec![]);
        let message = weather_message("scheduler");
        let id = message.id.clone();

        h.processor.process(&CancellationToken::new(), message).await.unwrap();

        let stored = h.store.get_message(&id).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Failed);
        assert_eq!(stored.retry_count, 1);
        assert!(stored.error_message.unwrap().contains("get_weather"));

        let result = h.store.get_result_by_message_id(&id).await.unwrap().unwrap();
        assert_eq!(result.status, ResultStatus::Failure);
        assert!(h.transport.publications().is_empty());
    }

    #[tokio::test]
    async fn test_transient_failure_is_redelivered() {
        let handler = Scripted::new(ActionType::GetWeather, Script::Transient);
        let h = harness(vec![handler]);
        let message = weather_message("scheduler");
        let id = message.id.clone();

        let err = h
            .processor
            .process(&CancellationToken::new(), message)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Execution(_)));

        let stored = h.store.get_message(&id).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Failed);

        // Redelivery moves the failed message back through processing.
        let handler = Scripted::new(ActionType::GetWeather, Script::Outcomes(vec!["ok"]));
        let retry = harness(vec![handler]);
        retry
            .processor
            .process(&CancellationToken::new(), stored)
            .await
            .unwrap();
        let redelivered = retry.store.get_message(&id).await.unwrap();
        assert_eq!(redelivered.status, MessageStatus::Completed);
        assert_eq!(redelivered.retry_count, 1);
    }

    #[tokio::test]
    async fn test_conflict_is_permanent() {
        let handler = Scripted::new(ActionType::GetWeather, Script::Conflict);
        let h = harness(vec![handler]);
        let message = weather_message("scheduler");
        let id = message.id.clone();

        h.processor.process(&CancellationToken::new(), message).await.unwrap();
        assert_eq!(
            h.store.get_message(&id).await.unwrap().status,
            MessageStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_invalid_payload_creates_no_result() {
        let h = harness(vec![]);
        let message = Message::new(
            "scheduler",
            Stage::Dev,
            MessageType::WebAction,
            json!({"action": "launch_rocket"}),
        );
        let id = message.id.clone();

        h.processor.process(&CancellationToken::new(), message).await.unwrap();

        assert_eq!(
            h.store.get_message(&id).await.unwrap().status,
            MessageStatus::Failed
        );
        assert_eq!(h.store.result_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_message_type_rejected() {
        let h = harness(vec![]);
        let message = Message::new("scheduler", Stage::Dev, MessageType::Notify, json!("hi"));
        let id = message.id.clone();

        h.processor.process(&CancellationToken::new(), message).await.unwrap();

        let stored = h.store.get_message(&id).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Failed);
        assert!(stored.error_message.unwrap().contains("web_action"));
    }
}
