//! Error types for queue consumption and topic publishing.

use actuator_core::error::ActuatorError;

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("Malformed record {record_id}: {reason}")]
    MalformedRecord { record_id: String, reason: String },
    #[error("Publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Core(#[from] ActuatorError),
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        MessagingError::Serialization(err.to_string())
    }
}
