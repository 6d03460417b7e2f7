//! Message lifecycle state machine.
//!
//! Created -> Queued -> Processing -> Completed/Failed
//! Failed -> Processing (redelivery)

use crate::error::ActuatorError;
use crate::types::MessageStatus;

/// Validate that a status transition is allowed.
///
/// Valid transitions:
/// - Created -> Queued
/// - Created -> Processing (delivered without an explicit queue hop)
/// - Queued -> Processing
/// - Processing -> Completed
/// - Processing -> Failed
/// - Failed -> Processing (redelivered by the queue layer)
///
/// Nothing leaves Completed.
pub fn validate_transition(from: MessageStatus, to: MessageStatus) -> Result<(), ActuatorError> {
    let valid = matches!(
        (from, to),
        (MessageStatus::Created, MessageStatus::Queued)
            | (MessageStatus::Created, MessageStatus::Processing)
            | (MessageStatus::Queued, MessageStatus::Processing)
            | (MessageStatus::Processing, MessageStatus::Completed)
            | (MessageStatus::Processing, MessageStatus::Failed)
            | (MessageStatus::Failed, MessageStatus::Processing)
    );

    if valid {
        Ok(())
    } else {
        Err(ActuatorError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [MessageStatus; 5] = [
        MessageStatus::Created,
        MessageStatus::Queued,
        MessageStatus::Processing,
        MessageStatus::Completed,
        MessageStatus::Failed,
    ];

    // =====================================================================
    // Valid transitions
    // =====================================================================

    #[test]
    fn test_created_to_queued() {
        assert!(validate_transition(MessageStatus::Created, MessageStatus::Queued).is_ok());
    }

    #[test]
    fn test_created_to_processing() {
        assert!(validate_transition(MessageStatus::Created, MessageStatus::Processing).is_ok());
    }

    #[test]
    fn test_queued_to_processing() {
        assert!(validate_transition(MessageStatus::Queued, MessageStatus::Processing).is_ok());
    }

    #[test]
    fn test_processing_to_terminal() {
        assert!(validate_transition(MessageStatus::Processing, MessageStatus::Completed).is_ok());
        assert!(validate_transition(MessageStatus::Processing, MessageStatus::Failed).is_ok());
    }

    #[test]
    fn test_failed_to_processing_retry_path() {
        assert!(validate_transition(MessageStatus::Failed, MessageStatus::Processing).is_ok());
    }

    // =====================================================================
    // Invalid transitions
    // =====================================================================

    #[test]
    fn test_nothing_leaves_completed() {
        for to in ALL {
            assert!(validate_transition(MessageStatus::Completed, to).is_err());
        }
    }

    #[test]
    fn test_self_transitions_rejected() {
        for status in ALL {
            assert!(validate_transition(status, status).is_err());
        }
    }

    #[test]
    fn test_no_regression_to_created_or_queued() {
        for from in ALL {
            assert!(validate_transition(from, MessageStatus::Created).is_err());
            if from != MessageStatus::Created {
                assert!(validate_transition(from, MessageStatus::Queued).is_err());
            }
        }
    }

    #[test]
    fn test_terminal_requires_processing() {
        for from in [MessageStatus::Created, MessageStatus::Queued, MessageStatus::Failed] {
            assert!(validate_transition(from, MessageStatus::Completed).is_err());
        }
        for from in [MessageStatus::Created, MessageStatus::Queued] {
            assert!(validate_transition(from, MessageStatus::Failed).is_err());
        }
    }

    #[test]
    fn test_error_carries_both_states() {
        let err = validate_transition(MessageStatus::Completed, MessageStatus::Failed).unwrap_err();
        match err {
            ActuatorError::InvalidTransition { from, to } => {
                assert_eq!(from, MessageStatus::Completed);
                assert_eq!(to, MessageStatus::Failed);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
