//! Error types for action dispatch and execution.

use actuator_core::error::ActuatorError;
use actuator_core::types::ActionType;
use actuator_http::{HttpError, SecretsError};
use actuator_storage::StorageError;

/// Errors from the web-action pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Payload validation failed: {0}")]
    InvalidPayload(String),
    #[error("No handler registered for action: {0}")]
    NoHandler(ActionType),
    #[error("Handler already registered for action: {0}")]
    DuplicateHandler(ActionType),
    #[error("Action execution failed: {0}")]
    Execution(String),
    #[error("Reservation conflict: {0}")]
    Conflict(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("HTTP error: {0}")]
    Http(HttpError),
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Core(#[from] ActuatorError),
    #[error("Action cancelled")]
    Cancelled,
}

impl ActionError {
    /// Failures that will not go away on redelivery.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ActionError::InvalidPayload(_)
                | ActionError::NoHandler(_)
                | ActionError::DuplicateHandler(_)
                | ActionError::Conflict(_)
                | ActionError::Config(_)
        )
    }
}

impl From<HttpError> for ActionError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Cancelled => ActionError::Cancelled,
            HttpError::Secrets(e) => ActionError::Secrets(e),
            other => ActionError::Http(other),
        }
    }
}
