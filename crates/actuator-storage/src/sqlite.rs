//! SQLite-backed repositories.
//!
//! Queries run on the blocking pool so async callers never hold the
//! connection mutex on a runtime worker thread.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row};
use serde_json::{Map, Value};

use actuator_core::message::Message;
use actuator_core::result::ActionResult;
use actuator_core::types::Timestamp;

use crate::db::Database;
use crate::error::StorageError;
use crate::repository::{MessageFilter, MessageRepository, ResultRepository, StatusUpdate};

const MESSAGE_COLUMNS: &str = "id, version, created_date, created_by, parent_id, stage, \
     message_type, status, payload, arguments, updated_date, error_message, retry_count";

const RESULT_COLUMNS: &str = "id, message_id, action, url, stage, status, response_code, \
     response_body, error_message, execution_time_ms, created_date, updated_date, ttl";

/// Repository implementation over a shared [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn run<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StorageError::Database(format!("Storage task failed: {}", e)))?
    }
}

/// Raw column values, converted to domain types outside the rusqlite closure.
struct MessageRow {
    id: String,
    version: String,
    created_date: i64,
    created_by: String,
    parent_id: Option<String>,
    stage: String,
    message_type: String,
    status: String,
    payload: String,
    arguments: String,
    updated_date: i64,
    error_message: Option<String>,
    retry_count: i64,
}

impl MessageRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            version: row.get(1)?,
            created_date: row.get(2)?,
            created_by: row.get(3)?,
            parent_id: row.get(4)?,
            stage: row.get(5)?,
            message_type: row.get(6)?,
            status: row.get(7)?,
            payload: row.get(8)?,
            arguments: row.get(9)?,
            updated_date: row.get(10)?,
            error_message: row.get(11)?,
            retry_count: row.get(12)?,
        })
    }

    fn into_message(self) -> Result<Message, StorageError> {
        let corrupt = |reason: String| StorageError::Corrupt {
            table: "messages",
            reason,
        };
        let payload: Value = serde_json::from_str(&self.payload)?;
        let arguments: Map<String, Value> = serde_json::from_str(&self.arguments)?;
        Ok(Message {
            version: self.version,
            id: self.id,
            created_date: Timestamp(self.created_date),
            created_by: self.created_by,
            parent_id: self.parent_id,
            stage: self.stage.parse().map_err(corrupt)?,
            message_type: self.message_type.parse().map_err(corrupt)?,
            status: self.status.parse().map_err(corrupt)?,
            payload,
            arguments,
            updated_date: Timestamp(self.updated_date),
            error_message: self.error_message,
            retry_count: u32::try_from(self.retry_count)
                .map_err(|_| corrupt(format!("retry_count out of range: {}", self.retry_count)))?,
        })
    }
}

struct ResultRow {
    id: String,
    message_id: String,
    action: String,
    url: String,
    stage: String,
    status: String,
    response_code: Option<i64>,
    response_body: Option<String>,
    error_message: Option<String>,
    execution_time_ms: i64,
    created_date: i64,
    updated_date: i64,
    ttl: i64,
}

impl ResultRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            message_id: row.get(1)?,
            action: row.get(2)?,
            url: row.get(3)?,
            stage: row.get(4)?,
            status: row.get(5)?,
            response_code: row.get(6)?,
            response_body: row.get(7)?,
            error_message: row.get(8)?,
            execution_time_ms: row.get(9)?,
            created_date: row.get(10)?,
            updated_date: row.get(11)?,
            ttl: row.get(12)?,
        })
    }

    fn into_result(self) -> Result<ActionResult, StorageError> {
        let corrupt = |reason: String| StorageError::Corrupt {
            table: "action_results",
            reason,
        };
        let response_code = self
            .response_code
            .map(|code| {
                u16::try_from(code).map_err(|_| corrupt(format!("bad response_code: {}", code)))
            })
            .transpose()?;
        Ok(ActionResult {
            id: self.id,
            message_id: self.message_id,
            action: self.action.parse().map_err(corrupt)?,
            url: self.url,
            stage: self.stage.parse().map_err(corrupt)?,
            status: self.status.parse().map_err(corrupt)?,
            response_code,
            response_body: self.response_body,
            error_message: self.error_message,
            execution_time_ms: self.execution_time_ms.max(0) as u64,
            created_date: Timestamp(self.created_date),
            updated_date: Timestamp(self.updated_date),
            ttl: Timestamp(self.ttl),
        })
    }
}

#[async_trait]
impl MessageRepository for SqliteStore {
    async fn save_message(&self, message: &Message) -> Result<(), StorageError> {
        let message = message.clone();
        self.run(move |db| {
            let payload = serde_json::to_string(&message.payload)?;
            let arguments = serde_json::to_string(&message.arguments)?;
            db.with_conn(|conn| {
                conn.execute(
                    &format!(
                        "INSERT OR REPLACE INTO messages ({MESSAGE_COLUMNS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                    ),
                    rusqlite::params![
                        message.id,
                        message.version,
                        message.created_date.0,
                        message.created_by,
                        message.parent_id,
                        message.stage.to_string(),
                        message.message_type.to_string(),
                        message.status.to_string(),
                        payload,
                        arguments,
                        message.updated_date.0,
                        message.error_message,
                        message.retry_count,
                    ],
                )?;
                Ok(())
            })
        })
        .await
    }

    async fn get_message(&self, id: &str) -> Result<Message, StorageError> {
        let id = id.to_string();
        self.run(move |db| {
            let row = db.with_conn(|conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                        rusqlite::params![id],
                        MessageRow::from_row,
                    )
                    .optional()?)
            })?;
            row.ok_or(StorageError::NotFound {
                kind: "message",
                id,
            })?
            .into_message()
        })
        .await
    }

    async fn update_status(&self, id: &str, update: &StatusUpdate) -> Result<(), StorageError> {
        let id = id.to_string();
        let update = update.clone();
        self.run(move |db| {
            let changed = db.with_conn(|conn| {
                Ok(conn.execute(
                    "UPDATE messages
                     SET status = ?1, error_message = ?2, retry_count = ?3, updated_date = ?4
                     WHERE id = ?5",
                    rusqlite::params![
                        update.status.to_string(),
                        update.error_message,
                        update.retry_count,
                        update.updated_date.0,
                        id,
                    ],
                )?)
            })?;
            if changed == 0 {
                return Err(StorageError::NotFound {
                    kind: "message",
                    id,
                });
            }
            Ok(())
        })
        .await
    }

    async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, StorageError> {
        let stage = filter.stage.map(|s| s.to_string());
        let status = filter.status.map(|s| s.to_string());
        let limit = filter.effective_limit() as i64;
        self.run(move |db| {
            let rows = db.with_conn(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE (?1 IS NULL OR stage = ?1) AND (?2 IS NULL OR status = ?2)
                     ORDER BY created_date DESC, id DESC
                     LIMIT ?3"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![stage, status, limit], MessageRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })?;
            rows.into_iter().map(MessageRow::into_message).collect()
        })
        .await
    }
}

#[async_trait]
impl ResultRepository for SqliteStore {
    async fn save_result(&self, result: &ActionResult) -> Result<(), StorageError> {
        let result = result.clone();
        self.run(move |db| {
            db.with_conn(|conn| {
                conn.execute(
                    &format!(
                        "INSERT OR REPLACE INTO action_results ({RESULT_COLUMNS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                    ),
                    rusqlite::params![
                        result.id,
                        result.message_id,
                        result.action.to_string(),
                        result.url,
                        result.stage.to_string(),
                        result.status.to_string(),
                        result.response_code,
                        result.response_body,
                        result.error_message,
                        result.execution_time_ms as i64,
                        result.created_date.0,
                        result.updated_date.0,
                        result.ttl.0,
                    ],
                )?;
                Ok(())
            })
        })
        .await
    }

    async fn get_result(&self, id: &str) -> Result<ActionResult, StorageError> {
        let id = id.to_string();
        self.run(move |db| {
            let row = db.with_conn(|conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {RESULT_COLUMNS} FROM action_results WHERE id = ?1"),
                        rusqlite::params![id],
                        ResultRow::from_row,
                    )
                    .optional()?)
            })?;
            row.ok_or(StorageError::NotFound {
                kind: "action result",
                id,
            })?
            .into_result()
        })
        .await
    }

    async fn get_result_by_message_id(
        &self,
        message_id: &str,
    ) -> Result<Option<ActionResult>, StorageError> {
        let message_id = message_id.to_string();
        self.run(move |db| {
            let row = db.with_conn(|conn| {
                Ok(conn
                    .query_row(
                        &format!(
                            "SELECT {RESULT_COLUMNS} FROM action_results
                             WHERE message_id = ?1
                             ORDER BY created_date DESC
                             LIMIT 1"
                        ),
                        rusqlite::params![message_id],
                        ResultRow::from_row,
                    )
                    .optional()?)
            })?;
            row.map(ResultRow::into_result).transpose()
        })
        .await
    }
}
