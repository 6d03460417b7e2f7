use thiserror::Error;

use crate::types::MessageStatus;

/// Top-level error type for the Actuator pipeline.
///
/// Subsystem crates define their own error types and carry an
/// `ActuatorError` through a `#[from]` variant so that `?` works across
/// crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ActuatorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: MessageStatus,
        to: MessageStatus,
    },

    #[error("Action result {0} is already finalized")]
    ResultFinalized(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ActuatorError {
    fn from(err: toml::de::Error) -> Self {
        ActuatorError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ActuatorError {
    fn from(err: toml::ser::Error) -> Self {
        ActuatorError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ActuatorError {
    fn from(err: serde_json::Error) -> Self {
        ActuatorError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Actuator operations.
pub type Result<T> = std::result::Result<T, ActuatorError>;
