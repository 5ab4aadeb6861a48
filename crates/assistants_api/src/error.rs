use std::fmt;

use assistant_service::ServiceError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum AssistantsApiError {
    MissingApiKey,
    InvalidBaseUrl(String),
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Decode { source: JsonError, body: String },
    Serde(JsonError),
    Runtime(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
}

impl ErrorPayloadFields {
    fn message_or_fallback(&self) -> Option<String> {
        let message = self.message.as_deref().and_then(non_empty_string)?;
        let qualifier = self
            .code
            .as_deref()
            .and_then(non_empty_string)
            .or_else(|| self.type_.as_deref().and_then(non_empty_string));

        Some(match qualifier {
            Some(qualifier) => format!("{message} ({qualifier})"),
            None => message.to_owned(),
        })
    }
}

impl fmt::Display for AssistantsApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "API key is required"),
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Decode { source, body } => {
                write!(f, "failed to decode response: {source} (body: {})", excerpt(body))
            }
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::Runtime(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for AssistantsApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Decode { source, .. } | Self::Serde(source) => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AssistantsApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for AssistantsApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

impl From<AssistantsApiError> for ServiceError {
    fn from(error: AssistantsApiError) -> Self {
        match error {
            AssistantsApiError::Status(status, message) => ServiceError::Status {
                status: status.as_u16(),
                message,
            },
            AssistantsApiError::Decode { .. } => ServiceError::Decode(error.to_string()),
            AssistantsApiError::Request(_) => ServiceError::Transport(error.to_string()),
            other => ServiceError::Unavailable(other.to_string()),
        }
    }
}

/// Extracts the human-readable message from an error response body.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = payload.value.as_ref().and_then(|value| value.message_or_fallback()) {
            return message;
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn excerpt(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let mut out: String = body.chars().take(MAX_CHARS).collect();
    if body.chars().count() > MAX_CHARS {
        out.push_str("...");
    }
    out
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
