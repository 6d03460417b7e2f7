//! Actuator messaging: queue batch consumption and outcome publishing.

pub mod consumer;
pub mod error;
pub mod publisher;
pub mod record;

pub use consumer::{
    BatchConsumer, BatchItemFailure, BatchResponse, MessageProcessor, RecordFailure,
    DEFAULT_MAX_CONCURRENCY,
};
pub use error::MessagingError;
pub use publisher::{
    message_attributes, InMemoryTransport, OutcomePublisher, Publication, PubSubTransport,
    PublishReceipt, TopicKind, TopicRouter,
};
pub use record::{Envelope, QueueRecord};
