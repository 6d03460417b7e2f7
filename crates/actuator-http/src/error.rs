//! Error types for outbound HTTP delivery.

use crate::secrets::SecretsError;

/// Errors from the resilient HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("HTTP client configuration failed: {0}")]
    Build(String),
    #[error("Request to {url} timed out")]
    Timeout { url: String },
    #[error("Connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },
    #[error("Transport error for {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("Request failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<HttpError> },
    #[error("Request cancelled")]
    Cancelled,
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Token endpoint error: {0}")]
    Token(String),
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),
}

impl HttpError {
    /// Network-level failures, 5xx, and 429 are worth another attempt.
    /// Everything else aborts immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::Timeout { .. } | HttpError::Connect { .. } | HttpError::Transport { .. } => {
                true
            }
            HttpError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// HTTP status of the final response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        if err.is_timeout() {
            HttpError::Timeout { url }
        } else if err.is_connect() {
            HttpError::Connect {
                url,
                reason: err.to_string(),
            }
        } else if err.is_builder() {
            HttpError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            HttpError::Decode(err.to_string())
        } else {
            HttpError::Transport {
                url,
                reason: err.to_string(),
            }
        }
    }
}
