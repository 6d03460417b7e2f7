//! The unit of work flowing through the pipeline.

pub mod state_machine;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ActuatorError, Result};
use crate::types::{
    new_id, MessageStatus, MessageType, Stage, Timestamp, AGENT_ORIGINATOR, MESSAGE_VERSION,
};

pub use state_machine::validate_transition;

/// A message travelling through the queue, the processors, and the topics.
///
/// `payload` is interpreted according to `message_type`; `arguments` carries
/// free-form parameters such as `operation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub version: String,
    pub id: String,
    pub created_date: Timestamp,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub stage: Stage,
    pub message_type: MessageType,
    pub status: MessageStatus,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub arguments: Map<String, Value>,
    pub updated_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
}

impl Message {
    /// Create a message in the `Created` state.
    pub fn new(
        created_by: impl Into<String>,
        stage: Stage,
        message_type: MessageType,
        payload: Value,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            version: MESSAGE_VERSION.to_string(),
            id: new_id("msg"),
            created_date: now,
            created_by: created_by.into(),
            parent_id: None,
            stage,
            message_type,
            status: MessageStatus::Created,
            payload,
            arguments: Map::new(),
            updated_date: now,
            error_message: None,
            retry_count: 0,
        }
    }

    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Whether the conversational agent produced this message.
    pub fn is_agent_originated(&self) -> bool {
        self.created_by == AGENT_ORIGINATOR
    }

    /// Move to `to`, refreshing `updated_date`. Rejected transitions leave
    /// the message untouched.
    pub fn transition_to(&mut self, to: MessageStatus) -> Result<()> {
        validate_transition(self.status, to)?;
        self.status = to;
        self.updated_date = Timestamp::now();
        Ok(())
    }

    pub fn mark_queued(&mut self) -> Result<()> {
        self.transition_to(MessageStatus::Queued)
    }

    pub fn mark_processing(&mut self) -> Result<()> {
        self.transition_to(MessageStatus::Processing)
    }

    pub fn mark_completed(&mut self) -> Result<()> {
        self.transition_to(MessageStatus::Completed)?;
        self.error_message = None;
        Ok(())
    }

    /// Mark the message failed. The error text and the incremented retry
    /// counter are applied together with the status so a single persisted
    /// update carries all three.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<()> {
        self.transition_to(MessageStatus::Failed)?;
        self.error_message = Some(error.into());
        self.retry_count = self.retry_count.saturating_add(1);
        Ok(())
    }

    /// Human-readable text for notification-style payloads: either the
    /// payload string itself or its `message` field.
    pub fn payload_text(&self) -> Option<String> {
        match &self.payload {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map
                .get("message")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            _ => None,
        }
    }

    /// Structural validation independent of any processor.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ActuatorError::Validation("message id is empty".into()));
        }
        if self.created_by.trim().is_empty() {
            return Err(ActuatorError::Validation("created_by is empty".into()));
        }
        if self.message_type == MessageType::ScheduleCreation {
            self.validate_schedule_arguments()?;
        }
        Ok(())
    }

    fn validate_schedule_arguments(&self) -> Result<()> {
        if self.arguments.is_empty() {
            return Err(ActuatorError::Validation(
                "arguments are required for schedule creation messages".into(),
            ));
        }

        let operation = ["action", "operation"]
            .iter()
            .filter_map(|key| self.arguments.get(*key).and_then(|v| v.as_str()))
            .find(|v| !v.is_empty())
            .ok_or_else(|| {
                ActuatorError::Validation(
                    "schedule creation requires an action or operation argument".into(),
                )
            })?;

        if operation == "create" {
            let missing: Vec<&str> = ["name", "schedule_expression", "target_type", "timezone"]
                .into_iter()
                .filter(|key| self.arguments.get(*key).map_or(true, Value::is_null))
                .collect();
            if !missing.is_empty() {
                return Err(ActuatorError::Validation(format!(
                    "missing schedule arguments: {}",
                    missing.join(", ")
                )));
            }
        }
        Ok(())
    }
}
