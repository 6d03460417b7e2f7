//! Persisted outcome of one web-action execution.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ActuatorError, Result};
use crate::types::{new_id, ActionType, ResultStatus, Stage, Timestamp};

/// How long the persistence layer keeps a result (72 hours).
pub const RESULT_TTL_SECS: i64 = 3 * 24 * 60 * 60;

/// Upper bound for stored outcome text, in bytes.
pub const MAX_RESPONSE_BODY_BYTES: usize = 50 * 1024;

pub const TRUNCATION_MARKER: &str = "... [TRUNCATED]";

/// One result per processed web-action message. Created `Pending`, then
/// finalized exactly once as `Success` or `Failure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub id: String,
    pub message_id: String,
    pub action: ActionType,
    pub url: String,
    pub stage: Stage,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub execution_time_ms: u64,
    pub created_date: Timestamp,
    pub updated_date: Timestamp,
    /// Expiry instant for the persistence layer.
    pub ttl: Timestamp,
}

impl ActionResult {
    pub fn new(
        message_id: impl Into<String>,
        action: ActionType,
        url: impl Into<String>,
        stage: Stage,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: new_id("result"),
            message_id: message_id.into(),
            action,
            url: url.into(),
            stage,
            status: ResultStatus::Pending,
            response_code: None,
            response_body: None,
            error_message: None,
            execution_time_ms: 0,
            created_date: now,
            updated_date: now,
            ttl: now.plus_secs(RESULT_TTL_SECS),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.status != ResultStatus::Pending
    }

    pub fn mark_success(&mut self, response_code: u16, body: &str, elapsed: Duration) -> Result<()> {
        self.ensure_pending()?;
        self.status = ResultStatus::Success;
        self.response_code = Some(response_code);
        self.response_body = Some(truncate_body(body));
        self.finish(elapsed);
        Ok(())
    }

    pub fn mark_failure(&mut self, error: impl Into<String>, elapsed: Duration) -> Result<()> {
        self.ensure_pending()?;
        self.status = ResultStatus::Failure;
        self.error_message = Some(error.into());
        self.finish(elapsed);
        Ok(())
    }

    fn ensure_pending(&self) -> Result<()> {
        if self.is_finalized() {
            return Err(ActuatorError::ResultFinalized(self.id.clone()));
        }
        Ok(())
    }

    fn finish(&mut self, elapsed: Duration) {
        self.execution_time_ms = elapsed.as_millis() as u64;
        self.updated_date = Timestamp::now();
    }
}

/// Cap `body` at [`MAX_RESPONSE_BODY_BYTES`] on a character boundary.
pub fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_RESPONSE_BODY_BYTES {
        return body.to_string();
    }
    let mut cut = MAX_RESPONSE_BODY_BYTES;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &body[..cut], TRUNCATION_MARKER)
}
