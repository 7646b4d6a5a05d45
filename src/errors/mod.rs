//! Error handling module for the records console.
//!
//! Every failure degrades to a visible message and a retryable state; the
//! taxonomy below decides where that message is shown.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const REJECTED: &str = "REJECTED";
    pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const INVALID_STATE: &str = "INVALID_STATE";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Application error type.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleError {
    /// Field-keyed validation messages, shown next to the matching cells
    Validation {
        message: String,
        fields: BTreeMap<String, String>,
    },
    /// The backend answered with a non-validation failure
    Rejected { status: u16, message: String },
    /// Connect, timeout or IO failure before a response arrived
    Transport(String),
    /// A success response whose payload could not be understood
    Decode(String),
    /// Local precondition failure; nothing was sent
    InvalidState(String),
    /// Local settings file could not be read or written
    Storage(String),
}

impl ConsoleError {
    /// Validation error for a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.clone());
        ConsoleError::Validation { message, fields }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::Validation { .. } => codes::VALIDATION_ERROR,
            ConsoleError::Rejected { .. } => codes::REJECTED,
            ConsoleError::Transport(_) => codes::TRANSPORT_ERROR,
            ConsoleError::Decode(_) => codes::DECODE_ERROR,
            ConsoleError::InvalidState(_) => codes::INVALID_STATE,
            ConsoleError::Storage(_) => codes::STORAGE_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            ConsoleError::Validation { message, .. } => message.clone(),
            ConsoleError::Rejected { message, .. } => message.clone(),
            ConsoleError::Transport(msg) => msg.clone(),
            ConsoleError::Decode(msg) => msg.clone(),
            ConsoleError::InvalidState(msg) => msg.clone(),
            ConsoleError::Storage(msg) => msg.clone(),
        }
    }

    /// Field-keyed messages, empty unless this is a validation error.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        match self {
            ConsoleError::Validation { fields, .. } => fields.clone(),
            _ => BTreeMap::new(),
        }
    }

    /// Build an error from a failed HTTP response body.
    ///
    /// Accepts the `{message, errors: {field: msg | [msg, ...]}}` envelope and
    /// falls back to the status line when the body is not JSON.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();

        let fields: BTreeMap<String, String> = parsed
            .errors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(field, value)| first_message(&value).map(|msg| (field, msg)))
            .collect();

        if !fields.is_empty() {
            let message = parsed
                .message
                .or_else(|| fields.values().next().cloned())
                .unwrap_or_else(|| "The given data was invalid.".to_string());
            return ConsoleError::Validation { message, fields };
        }

        let message = parsed
            .message
            .filter(|msg| !msg.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}", status));
        ConsoleError::Rejected { status, message }
    }
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ConsoleError {}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Transport error: {:?}", err);
        if err.is_timeout() {
            ConsoleError::Transport("The server did not respond in time".to_string())
        } else if err.is_decode() {
            ConsoleError::Decode(format!("Unreadable response: {}", err))
        } else {
            ConsoleError::Transport(format!("Network error: {}", err))
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ConsoleError::Decode(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("IO error: {:?}", err);
        ConsoleError::Storage(format!("IO error: {}", err))
    }
}

/// Failure envelope returned by the backend.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Map<String, Value>>,
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        _ => None,
    }
}
