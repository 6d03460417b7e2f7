//! Persistence contracts for messages and action results.

use async_trait::async_trait;

use actuator_core::message::Message;
use actuator_core::result::ActionResult;
use actuator_core::types::{MessageStatus, Stage, Timestamp};

use crate::error::StorageError;

/// Rows returned by [`MessageRepository::list_messages`] when no limit is given.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Status change persisted as one write: status, error text, retry count,
/// and update time travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: MessageStatus,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub updated_date: Timestamp,
}

impl StatusUpdate {
    pub fn from_message(message: &Message) -> Self {
        Self {
            status: message.status,
            error_message: message.error_message.clone(),
            retry_count: message.retry_count,
            updated_date: message.updated_date,
        }
    }
}

/// Filters for listing messages. Newest first.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub stage: Option<Stage>,
    pub status: Option<MessageStatus>,
    pub limit: Option<usize>,
}

impl MessageFilter {
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            Some(0) | None => DEFAULT_LIST_LIMIT,
            Some(n) => n,
        }
    }

    pub fn matches(&self, message: &Message) -> bool {
        self.stage.map_or(true, |s| s == message.stage)
            && self.status.map_or(true, |s| s == message.status)
    }
}

/// Durable message store keyed by message id.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert or fully replace a message.
    async fn save_message(&self, message: &Message) -> Result<(), StorageError>;

    async fn get_message(&self, id: &str) -> Result<Message, StorageError>;

    async fn update_status(&self, id: &str, update: &StatusUpdate) -> Result<(), StorageError>;

    async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, StorageError>;
}

/// Durable action result store with a secondary lookup by message id.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Insert or fully replace a result.
    async fn save_result(&self, result: &ActionResult) -> Result<(), StorageError>;

    async fn get_result(&self, id: &str) -> Result<ActionResult, StorageError>;

    async fn get_result_by_message_id(
        &self,
        message_id: &str,
    ) -> Result<Option<ActionResult>, StorageError>;
}
