//! Queue records and the pub/sub envelope some of them arrive in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use actuator_core::message::Message;

use crate::error::MessagingError;

/// One opaque record from a queue batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueRecord {
    /// Identifier the queue uses for redelivery.
    pub record_id: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl QueueRecord {
    pub fn new(record_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            body: body.into(),
            attributes: HashMap::new(),
        }
    }

    /// Record carrying `message` serialized directly as the body.
    pub fn from_message(record_id: impl Into<String>, message: &Message) -> Result<Self, MessagingError> {
        Ok(Self::new(record_id, serde_json::to_string(message)?))
    }

    /// Record carrying `message` wrapped in a fan-out [`Envelope`].
    pub fn enveloped(record_id: impl Into<String>, message: &Message) -> Result<Self, MessagingError> {
        let envelope = Envelope {
            kind: Some("Notification".to_string()),
            message_id: None,
            topic: None,
            message: serde_json::to_string(message)?,
        };
        Ok(Self::new(record_id, serde_json::to_string(&envelope)?))
    }

    /// Deserialize the carried [`Message`], unwrapping an envelope if present.
    pub fn parse_message(&self) -> Result<Message, MessagingError> {
        let malformed = |reason: String| MessagingError::MalformedRecord {
            record_id: self.record_id.clone(),
            reason,
        };

        let inner = match serde_json::from_str::<Envelope>(&self.body) {
            Ok(envelope) => envelope.message,
            Err(_) => self.body.clone(),
        };

        serde_json::from_str::<Message>(&inner).map_err(|e| malformed(e.to_string()))
    }
}

/// Fan-out delivery wrapper: the serialized message sits in `Message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "MessageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(rename = "TopicArn", default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(rename = "Message")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use actuator_core::types::{MessageType, Stage};
    use serde_json::json;

    fn sample() -> Message {
        Message::new("scheduler", Stage::Dev, MessageType::Notify, json!("tee time soon"))
    }

    #[test]
    fn test_parse_raw_body() {
        let msg = sample();
        let record = QueueRecord::from_message("r-1", &msg).unwrap();
        assert_eq!(record.parse_message().unwrap(), msg);
    }

    #[test]
    fn test_parse_enveloped_body() {
        let msg = sample();
        let record = QueueRecord::enveloped("r-2", &msg).unwrap();
        assert!(record.body.contains("\"Message\""));
        assert_eq!(record.parse_message().unwrap(), msg);
    }

    #[test]
    fn test_envelope_with_extra_fields() {
        let msg = sample();
        let body = json!({
            "Type": "Notification",
            "MessageId": "abc",
            "TopicArn": "arn:topic",
            "Timestamp": "2025-01-01T00:00:00Z",
            "Message": serde_json::to_string(&msg).unwrap(),
        });
        let record = QueueRecord::new("r-3", body.to_string());
        assert_eq!(record.parse_message().unwrap(), msg);
    }

    #[test]
    fn test_malformed_body() {
        let err = QueueRecord::new("r-4", "{not json").parse_message().unwrap_err();
        match err {
            MessagingError::MalformedRecord { record_id, .. } => assert_eq!(record_id, "r-4"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_envelope_with_malformed_inner() {
        let body = json!({"Message": "still not a message"}).to_string();
        assert!(QueueRecord::new("r-5", body).parse_message().is_err());
    }
}
