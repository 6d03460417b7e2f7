//! Web-action payloads and their authentication descriptors.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use actuator_core::types::ActionType;
use actuator_http::redact::{is_sensitive, REDACTED};

use crate::error::ActionError;

/// Payload schema version written by this crate.
pub const PAYLOAD_VERSION: &str = "1.0";

/// How a handler authenticates against its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    None,
    OauthPassword,
    ApiKey,
    Bearer,
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthType::None => write!(f, "none"),
            AuthType::OauthPassword => write!(f, "oauth_password"),
            AuthType::ApiKey => write!(f, "api_key"),
            AuthType::Bearer => write!(f, "bearer"),
        }
    }
}

/// Authentication descriptor carried by a payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(rename = "type", default)]
    pub auth_type: AuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ActionError> {
        let has_secret = self
            .secret_name
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        match self.auth_type {
            AuthType::OauthPassword | AuthType::ApiKey | AuthType::Bearer if !has_secret => {
                Err(ActionError::InvalidPayload(format!(
                    "secret_name is required for {} authentication",
                    self.auth_type
                )))
            }
            _ => Ok(()),
        }
    }

    fn redacted(&self) -> Self {
        Self {
            secret_name: self.secret_name.as_ref().map(|_| REDACTED.to_string()),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| {
                    let shown = if is_sensitive(k) { REDACTED } else { v.as_str() };
                    (k.clone(), shown.to_string())
                })
                .collect(),
            ..self.clone()
        }
    }
}

/// Typed payload of a `web_action` message.
///
/// Field names are snake_case on the wire; the camelCase spellings used by
/// older producers are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub url: String,
    pub action: ActionType,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub arguments: Map<String, Value>,
    #[serde(default, alias = "authConfig", skip_serializing_if = "Option::is_none")]
    pub auth_config: Option<AuthConfig>,
    #[serde(default, alias = "courseID", alias = "courseId")]
    pub course_id: i64,
    #[serde(default)]
    pub days: u32,
    #[serde(default, alias = "startSearchTime", skip_serializing_if = "Option::is_none")]
    pub start_search_time: Option<String>,
    #[serde(default, alias = "endSearchTime", skip_serializing_if = "Option::is_none")]
    pub end_search_time: Option<String>,
    #[serde(default, alias = "numberOfPlayers")]
    pub number_of_players: u32,
    #[serde(default, alias = "teeSheetID", alias = "teeSheetId")]
    pub tee_sheet_id: i64,
    #[serde(default, alias = "autoBook")]
    pub auto_book: bool,
    #[serde(default, alias = "maxResults")]
    pub max_results: u32,
}

fn default_version() -> String {
    PAYLOAD_VERSION.to_string()
}

impl ActionPayload {
    pub fn new(action: ActionType, url: impl Into<String>) -> Self {
        Self {
            version: default_version(),
            url: url.into(),
            action,
            arguments: Map::new(),
            auth_config: None,
            course_id: 0,
            days: 0,
            start_search_time: None,
            end_search_time: None,
            number_of_players: 0,
            tee_sheet_id: 0,
            auto_book: false,
            max_results: 0,
        }
    }

    /// Parse and validate a message payload. Accepts either a JSON object
    /// or a string holding serialized JSON.
    pub fn from_value(value: &Value) -> Result<Self, ActionError> {
        let payload: ActionPayload = match value {
            Value::String(raw) => serde_json::from_str(raw),
            Value::Object(_) => serde_json::from_value(value.clone()),
            other => {
                return Err(ActionError::InvalidPayload(format!(
                    "expected an object, got {}",
                    json_kind(other)
                )))
            }
        }
        .map_err(|e| ActionError::InvalidPayload(e.to_string()))?;
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), ActionError> {
        match self.action {
            ActionType::GetWeather => {
                if self.url.trim().is_empty() {
                    return Err(ActionError::InvalidPayload(
                        "url is required for get_weather".into(),
                    ));
                }
                if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
                    return Err(ActionError::InvalidPayload(format!(
                        "url must be http(s): {}",
                        self.url
                    )));
                }
            }
            ActionType::FetchReservations | ActionType::SearchTeeTimes | ActionType::BookTeeTime => {
                if self.course_id <= 0 {
                    return Err(ActionError::InvalidPayload(format!(
                        "course_id is required for {}",
                        self.action
                    )));
                }
            }
            ActionType::SendNotification => {}
        }
        if let Some(auth) = &self.auth_config {
            auth.validate()?;
        }
        Ok(())
    }

    /// Copy safe to log: secret names and credential-bearing headers and
    /// arguments are masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.auth_config = self.auth_config.as_ref().map(AuthConfig::redacted);
        for (key, value) in copy.arguments.iter_mut() {
            if is_sensitive(key) {
                *value = Value::String(REDACTED.to_string());
            }
        }
        copy
    }

    /// String argument from the payload's own argument map.
    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
