//! In-memory repositories.
//!
//! Same contract as the SQLite store; contents vanish with the process.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use actuator_core::message::Message;
use actuator_core::result::ActionResult;

use crate::error::StorageError;
use crate::repository::{MessageFilter, MessageRepository, ResultRepository, StatusUpdate};

/// Thread-safe in-memory store implementing both repositories.
#[derive(Debug, Default)]
pub struct MemoryStore {
    messages: RwLock<HashMap<String, Message>>,
    results: RwLock<HashMap<String, ActionResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_count(&self) -> usize {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn result_count(&self) -> usize {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Every stored result, oldest first.
    pub fn all_results(&self) -> Vec<ActionResult> {
        let mut results: Vec<ActionResult> = self
            .results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        results.sort_by(|a, b| a.created_date.cmp(&b.created_date).then(a.id.cmp(&b.id)));
        results
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn save_message(&self, message: &Message) -> Result<(), StorageError> {
        self.messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(message.id.clone(), message.clone());
        Ok(())
    }

    async fn get_message(&self, id: &str) -> Result<Message, StorageError> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                kind: "message",
                id: id.to_string(),
            })
    }

    async fn update_status(&self, id: &str, update: &StatusUpdate) -> Result<(), StorageError> {
        let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
        let message = messages.get_mut(id).ok_or_else(|| StorageError::NotFound {
            kind: "message",
            id: id.to_string(),
        })?;
        message.status = update.status;
        message.error_message = update.error_message.clone();
        message.retry_count = update.retry_count;
        message.updated_date = update.updated_date;
        Ok(())
    }

    async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, StorageError> {
        let messages = self.messages.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<Message> = messages
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_date
                .cmp(&a.created_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        found.truncate(filter.effective_limit());
        Ok(found)
    }
}

#[async_trait]
impl ResultRepository for MemoryStore {
    async fn save_result(&self, result: &ActionResult) -> Result<(), StorageError> {
        self.results
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(result.id.clone(), result.clone());
        Ok(())
    }

    async fn get_result(&self, id: &str) -> Result<ActionResult, StorageError> {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                kind: "action result",
                id: id.to_string(),
            })
    }

    async fn get_result_by_message_id(
        &self,
        message_id: &str,
    ) -> Result<Option<ActionResult>, StorageError> {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        Ok(results
            .values()
            .filter(|r| r.message_id == message_id)
            .max_by_key(|r| r.created_date)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actuator_core::types::{ActionType, MessageStatus, MessageType, Stage, Timestamp};
    use serde_json::json;
    use std::time::Duration;

    fn message(stage: Stage, created: i64) -> Message {
        let mut msg = Message::new("tester", stage, MessageType::Notify, json!("hi"));
        msg.created_date = Timestamp(created);
        msg
    }

    #[tokio::test]
    async fn test_save_and_get_message() {
        let store = MemoryStore::new();
        let msg = message(Stage::Dev, 10);
        store.save_message(&msg).await.unwrap();
        assert_eq!(store.get_message(&msg.id).await.unwrap(), msg);
        assert_eq!(store.message_count(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_message() {
        let err = MemoryStore::new().get_message("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { kind: "message", .. }));
    }

    #[tokio::test]
    async fn test_update_status_persists_all_fields() {
        let store = MemoryStore::new();
        let mut msg = message(Stage::Dev, 10);
        store.save_message(&msg).await.unwrap();

        msg.mark_processing().unwrap();
        msg.mark_failed("downstream 503").unwrap();
        store
            .update_status(&msg.id, &StatusUpdate::from_message(&msg))
            .await
            .unwrap();

        let stored = store.get_message(&msg.id).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some("downstream 503"));
        assert_eq!(stored.retry_count, 1);
    }

    #[tokio::test]
    async fn test_update_status_missing() {
        let msg = message(Stage::Dev, 10);
        let err = MemoryStore::new()
            .update_status("missing", &StatusUpdate::from_message(&msg))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let store = MemoryStore::new();
        for (stage, created) in [(Stage::Dev, 1), (Stage::Prod, 2), (Stage::Dev, 3)] {
            store.save_message(&message(stage, created)).await.unwrap();
        }

        let dev = store
            .list_messages(&MessageFilter {
                stage: Some(Stage::Dev),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(dev.len(), 2);
        assert_eq!(dev[0].created_date, Timestamp(3));
        assert_eq!(dev[1].created_date, Timestamp(1));

        let limited = store
            .list_messages(&MessageFilter {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].created_date, Timestamp(3));
    }

    #[tokio::test]
    async fn test_results_by_message_id() {
        let store = MemoryStore::new();
        let mut result = ActionResult::new("msg_a", ActionType::GetWeather, "u", Stage::Dev);
        store.save_result(&result).await.unwrap();

        result.mark_success(200, "ok", Duration::ZERO).unwrap();
        store.save_result(&result).await.unwrap();

        assert_eq!(store.result_count(), 1);
        let found = store.get_result_by_message_id("msg_a").await.unwrap().unwrap();
        assert_eq!(found, result);
        assert!(store.get_result_by_message_id("msg_b").await.unwrap().is_none());
        assert_eq!(store.get_result(&result.id).await.unwrap(), result);
    }
}
