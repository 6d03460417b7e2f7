//! Batch consumption with per-record failure isolation.
//!
//! Every record is parsed and processed independently. A record that fails
//! to parse, returns an error, panics, or is skipped because the batch was
//! cancelled ends up in the failure report so the queue redelivers it; every
//! other record counts as acknowledged.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use async_trait::async_trait;
use futures::{stream, FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use actuator_core::message::Message;

use crate::record::QueueRecord;

/// Default number of messages processed at once within a batch.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Per-message processing step driven by [`BatchConsumer`].
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    type Error: fmt::Display + Send;

    async fn process(&self, cancel: &CancellationToken, message: Message) -> Result<(), Self::Error>;
}

/// Why a single record failed.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordFailure {
    Malformed(String),
    Processing(String),
    Panicked(String),
    Cancelled,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordFailure::Malformed(reason) => write!(f, "malformed record: {}", reason),
            RecordFailure::Processing(reason) => write!(f, "processing failed: {}", reason),
            RecordFailure::Panicked(reason) => write!(f, "processing panicked: {}", reason),
            RecordFailure::Cancelled => write!(f, "batch cancelled before processing"),
        }
    }
}

/// Wire shape of one entry in a queue partial-failure response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    #[serde(rename = "itemIdentifier")]
    pub item_identifier: String,
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResponse {
    /// Failed record ids, in input order.
    pub failed_record_ids: Vec<String>,
    /// Failure reason per entry of `failed_record_ids`.
    pub failures: Vec<RecordFailure>,
    pub processed: usize,
}

impl BatchResponse {
    pub fn failed(&self) -> usize {
        self.failed_record_ids.len()
    }

    pub fn total(&self) -> usize {
        self.processed + self.failed()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed_record_ids.is_empty()
    }

    /// Entries for a queue partial-batch response.
    pub fn item_failures(&self) -> Vec<BatchItemFailure> {
        self.failed_record_ids
            .iter()
            .map(|id| BatchItemFailure {
                item_identifier: id.clone(),
            })
            .collect()
    }
}

/// Drives a [`MessageProcessor`] over queue batches.
pub struct BatchConsumer<P> {
    processor: P,
    max_concurrency: usize,
}

impl<P: MessageProcessor> BatchConsumer<P> {
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Bound on concurrently processed messages; zero is treated as one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Process one batch and report which records must be redelivered.
    pub async fn process_batch(
        &self,
        cancel: &CancellationToken,
        records: Vec<QueueRecord>,
    ) -> BatchResponse {
        let started = Instant::now();
        let total = records.len();
        info!(records = total, "Processing batch");

        let mut outcomes: Vec<(usize, String, Result<(), RecordFailure>)> =
            stream::iter(records.into_iter().enumerate())
                .map(|(index, record)| async move {
                    let outcome = self.process_record(cancel, &record).await;
                    (index, record.record_id, outcome)
                })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut response = BatchResponse::default();
        for (_, record_id, outcome) in outcomes {
            match outcome {
                Ok(()) => response.processed += 1,
                Err(failure) => {
                    response.failed_record_ids.push(record_id);
                    response.failures.push(failure);
                }
            }
        }

        info!(
            processed = response.processed,
            failed = response.failed(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Batch finished"
        );
        response
    }

    async fn process_record(
        &self,
        cancel: &CancellationToken,
        record: &QueueRecord,
    ) -> Result<(), RecordFailure> {
        if cancel.is_cancelled() {
            debug!(record_id = %record.record_id, "Skipping record, batch cancelled");
            return Err(RecordFailure::Cancelled);
        }

        let message = record.parse_message().map_err(|e| {
            warn!(record_id = %record.record_id, error = %e, "Failed to parse record");
            RecordFailure::Malformed(e.to_string())
        })?;
        let message_id = message.id.clone();

        match AssertUnwindSafe(self.processor.process(cancel, message))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {
                debug!(record_id = %record.record_id, message_id = %message_id, "Record processed");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(
                    record_id = %record.record_id,
                    message_id = %message_id,
                    error = %e,
                    "Record processing failed"
                );
                Err(RecordFailure::Processing(e.to_string()))
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(
                    record_id = %record.record_id,
                    message_id = %message_id,
                    panic_msg = %reason,
                    "Record processing panicked"
                );
                Err(RecordFailure::Panicked(reason))
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
