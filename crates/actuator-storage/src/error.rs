//! Error types for persistence.

use actuator_core::error::ActuatorError;

/// Errors from message and result repositories.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },
    #[error(transparent)]
    Core(#[from] ActuatorError),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StorageError::NotFound {
            kind: "message",
            id: "msg_1".into(),
        };
        assert_eq!(err.to_string(), "message not found: msg_1");

        let err = StorageError::Corrupt {
            table: "messages",
            reason: "bad status".into(),
        };
        assert_eq!(err.to_string(), "Corrupt row in messages: bad status");
    }

    #[test]
    fn test_from_rusqlite() {
        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StorageError::Database(_)));
    }

    #[test]
    fn test_from_core_error() {
        let err: StorageError = ActuatorError::Config("x".into()).into();
        assert_eq!(err.to_string(), "Configuration error: x");
    }
}
