//! Topic routing and outcome publishing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{error, info};

use actuator_core::config::TopicsConfig;
use actuator_core::message::Message;
use actuator_core::types::MessageType;

use crate::error::MessagingError;

/// Logical destination for a published message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TopicKind {
    WebActions,
    Notifications,
    AgentResponse,
    ScheduleCreation,
}

/// Maps messages to configured topic names.
#[derive(Debug, Clone)]
pub struct TopicRouter {
    topics: TopicsConfig,
}

impl TopicRouter {
    pub fn new(topics: TopicsConfig) -> Self {
        Self { topics }
    }

    /// Pick the topic for `outcome`. When the message that triggered it came
    /// from the agent, the outcome always goes back to the agent.
    pub fn route(&self, outcome: &Message, original: Option<&Message>) -> TopicKind {
        if original.is_some_and(Message::is_agent_originated) {
            return TopicKind::AgentResponse;
        }
        match outcome.message_type {
            MessageType::WebAction => TopicKind::WebActions,
            MessageType::AgentResponse => TopicKind::AgentResponse,
            MessageType::ScheduleCreation => TopicKind::ScheduleCreation,
            MessageType::Notify | MessageType::Scheduled | MessageType::HelloWorld => {
                TopicKind::Notifications
            }
        }
    }

    pub fn topic_name(&self, kind: TopicKind) -> &str {
        match kind {
            TopicKind::WebActions => &self.topics.web_actions,
            TopicKind::Notifications => &self.topics.notifications,
            TopicKind::AgentResponse => &self.topics.agent_response,
            TopicKind::ScheduleCreation => &self.topics.schedule_creation,
        }
    }
}

/// Pub/sub backend. Returns the publication id assigned by the transport.
#[async_trait]
pub trait PubSubTransport: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        body: String,
        attributes: HashMap<String, String>,
    ) -> Result<String, MessagingError>;
}

/// A publication captured by [`InMemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub id: String,
    pub topic: String,
    pub body: String,
    pub attributes: HashMap<String, String>,
}

impl Publication {
    pub fn message(&self) -> Result<Message, MessagingError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Records publications in memory; can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    published: Mutex<Vec<Publication>>,
    failing: AtomicBool,
    next_id: AtomicU64,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn publications(&self) -> Vec<Publication> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn publications_to(&self, topic: &str) -> Vec<Publication> {
        self.publications()
            .into_iter()
            .filter(|p| p.topic == topic)
            .collect()
    }
}

#[async_trait]
impl PubSubTransport for InMemoryTransport {
    async fn publish(
        &self,
        topic: &str,
        body: String,
        attributes: HashMap<String, String>,
    ) -> Result<String, MessagingError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessagingError::Publish {
                topic: topic.to_string(),
                reason: "transport unavailable".to_string(),
            });
        }
        let id = format!("pub-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Publication {
                id: id.clone(),
                topic: topic.to_string(),
                body,
                attributes,
            });
        Ok(id)
    }
}

/// Where a message was published.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    pub topic: String,
    pub publication_id: String,
}

/// Serializes messages and sends them to the routed topic.
#[derive(Clone)]
pub struct OutcomePublisher {
    transport: Arc<dyn PubSubTransport>,
    router: TopicRouter,
}

impl OutcomePublisher {
    pub fn new(transport: Arc<dyn PubSubTransport>, topics: TopicsConfig) -> Self {
        Self {
            transport,
            router: TopicRouter::new(topics),
        }
    }

    pub fn router(&self) -> &TopicRouter {
        &self.router
    }

    /// Publish `message`, routed by its own type and the originator of
    /// `original` when given.
    pub async fn publish(
        &self,
        message: &Message,
        original: Option<&Message>,
    ) -> Result<PublishReceipt, MessagingError> {
        let kind = self.router.route(message, original);
        self.publish_to(kind, message).await
    }

    /// Publish to an explicit topic, bypassing routing.
    pub async fn publish_to(
        &self,
        kind: TopicKind,
        message: &Message,
    ) -> Result<PublishReceipt, MessagingError> {
        let topic = self.router.topic_name(kind).to_string();
        let body = serde_json::to_string(message)?;

        match self
            .transport
            .publish(&topic, body, message_attributes(message))
            .await
        {
            Ok(publication_id) => {
                info!(
                    message_id = %message.id,
                    topic = %topic,
                    publication_id = %publication_id,
                    "Message published"
                );
                Ok(PublishReceipt {
                    topic,
                    publication_id,
                })
            }
            Err(e) => {
                error!(message_id = %message.id, topic = %topic, error = %e, "Publish failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for OutcomePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomePublisher")
            .field("router", &self.router)
            .finish()
    }
}

/// Attributes attached to every publication for subscriber-side filtering.
pub fn message_attributes(message: &Message) -> HashMap<String, String> {
    HashMap::from([
        ("stage".to_string(), message.stage.to_string()),
        ("message_type".to_string(), message.message_type.to_string()),
        ("status".to_string(), message.status.to_string()),
    ])
}
