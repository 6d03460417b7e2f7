use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Originator tag used by the conversational agent. Outcomes of messages
/// carrying this tag are routed back to the agent.
pub const AGENT_ORIGINATOR: &str = "ai-agent";

/// Schema version stamped on newly constructed messages.
pub const MESSAGE_VERSION: &str = "1.0";

// =============================================================================
// Enums
// =============================================================================

/// Deployment stage a message belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Dev,
    Stage,
    Prod,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Dev => write!(f, "dev"),
            Stage::Stage => write!(f, "stage"),
            Stage::Prod => write!(f, "prod"),
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Stage::Dev),
            "stage" => Ok(Stage::Stage),
            "prod" => Ok(Stage::Prod),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

/// Kind of work a message carries. Determines how `payload` is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    HelloWorld,
    Notify,
    AgentResponse,
    Scheduled,
    WebAction,
    ScheduleCreation,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::HelloWorld => write!(f, "hello_world"),
            MessageType::Notify => write!(f, "notify"),
            MessageType::AgentResponse => write!(f, "agent_response"),
            MessageType::Scheduled => write!(f, "scheduled"),
            MessageType::WebAction => write!(f, "web_action"),
            MessageType::ScheduleCreation => write!(f, "schedule_creation"),
        }
    }
}

impl std::str::FromStr for MessageType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hello_world" => Ok(MessageType::HelloWorld),
            "notify" => Ok(MessageType::Notify),
            "agent_response" => Ok(MessageType::AgentResponse),
            "scheduled" => Ok(MessageType::Scheduled),
            "web_action" => Ok(MessageType::WebAction),
            "schedule_creation" => Ok(MessageType::ScheduleCreation),
            _ => Err(format!("Unknown message type: {}", s)),
        }
    }
}

/// Lifecycle status of a message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    Created,
    Queued,
    Processing,
    Completed,
    Failed,
}

impl MessageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Completed | MessageStatus::Failed)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageStatus::Created => write!(f, "created"),
            MessageStatus::Queued => write!(f, "queued"),
            MessageStatus::Processing => write!(f, "processing"),
            MessageStatus::Completed => write!(f, "completed"),
            MessageStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(MessageStatus::Created),
            "queued" => Ok(MessageStatus::Queued),
            "processing" => Ok(MessageStatus::Processing),
            "completed" => Ok(MessageStatus::Completed),
            "failed" => Ok(MessageStatus::Failed),
            _ => Err(format!("Unknown message status: {}", s)),
        }
    }
}

/// Closed set of side-effecting actions a web-action message can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    GetWeather,
    FetchReservations,
    SearchTeeTimes,
    BookTeeTime,
    SendNotification,
}

impl ActionType {
    pub const ALL: [ActionType; 5] = [
        ActionType::GetWeather,
        ActionType::FetchReservations,
        ActionType::SearchTeeTimes,
        ActionType::BookTeeTime,
        ActionType::SendNotification,
    ];
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::GetWeather => write!(f, "get_weather"),
            ActionType::FetchReservations => write!(f, "fetch_reservations"),
            ActionType::SearchTeeTimes => write!(f, "search_tee_times"),
            ActionType::BookTeeTime => write!(f, "book_tee_time"),
            ActionType::SendNotification => write!(f, "send_notification"),
        }
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get_weather" => Ok(ActionType::GetWeather),
            "fetch_reservations" => Ok(ActionType::FetchReservations),
            "search_tee_times" => Ok(ActionType::SearchTeeTimes),
            "book_tee_time" => Ok(ActionType::BookTeeTime),
            "send_notification" => Ok(ActionType::SendNotification),
            _ => Err(format!("Unknown action type: {}", s)),
        }
    }
}

/// Outcome status of an action result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    #[default]
    Pending,
    Success,
    Failure,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Pending => write!(f, "pending"),
            ResultStatus::Success => write!(f, "success"),
            ResultStatus::Failure => write!(f, "failure"),
        }
    }
}

impl std::str::FromStr for ResultStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ResultStatus::Pending),
            "success" => Ok(ResultStatus::Success),
            "failure" => Ok(ResultStatus::Failure),
            _ => Err(format!("Unknown result status: {}", s)),
        }
    }
}

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Unix timestamp in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }

    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

/// Generate a prefixed identifier such as `msg_3f2a...`.
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}
