//! Best-effort persistence for the processors.
//!
//! Status and result writes must never abort work that already happened
//! (or is about to happen) externally. Every write goes through
//! [`BestEffortStore`], which logs a failure with the message id, counts it,
//! and swallows it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{error, warn};

use actuator_core::message::Message;
use actuator_core::result::ActionResult;
use actuator_storage::{MessageRepository, ResultRepository, StatusUpdate, StorageError};

#[derive(Clone)]
pub struct BestEffortStore {
    messages: Arc<dyn MessageRepository>,
    results: Option<Arc<dyn ResultRepository>>,
    failures: Arc<AtomicUsize>,
}

impl BestEffortStore {
    pub fn new(messages: Arc<dyn MessageRepository>, results: Arc<dyn ResultRepository>) -> Self {
        Self {
            messages,
            results: Some(results),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Store without a result repository; result writes become no-ops.
    pub fn messages_only(messages: Arc<dyn MessageRepository>) -> Self {
        Self {
            messages,
            results: None,
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Writes that failed since construction.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub async fn save_message(&self, message: &Message, step: &str) {
        let outcome = self.messages.save_message(message).await;
        self.record(outcome, step, &message.id, false);
    }

    /// Persist the message's status, error text, and retry count together.
    pub async fn update_status(&self, message: &Message, step: &str) {
        let outcome = self
            .messages
            .update_status(&message.id, &StatusUpdate::from_message(message))
            .await;
        self.record(outcome, step, &message.id, message.status.is_terminal());
    }

    pub async fn save_result(&self, result: &ActionResult, step: &str) {
        if let Some(results) = &self.results {
            let outcome = results.save_result(result).await;
            self.record(outcome, step, &result.message_id, result.is_finalized());
        }
    }

    fn record(&self, outcome: Result<(), StorageError>, step: &str, message_id: &str, terminal: bool) {
        let Err(e) = outcome else {
            return;
        };
        self.failures.fetch_add(1, Ordering::Relaxed);
        if terminal {
            error!(message_id = %message_id, step = %step, error = %e, "Failed to persist final state");
        } else {
            warn!(message_id = %message_id, step = %step, error = %e, "Failed to persist state");
        }
    }
}

impl std::fmt::Debug for BestEffortStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestEffortStore")
            .field("has_results", &self.results.is_some())
            .field("failures", &self.failures())
            .finish()
    }
}
