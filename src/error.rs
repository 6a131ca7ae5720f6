//! Error types for the SolveBio client library.

use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// A non-2xx response from the API, carrying the server-provided message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    /// Build an error from a response status and raw body.
    ///
    /// The message is taken from the JSON body when possible: `detail`, then
    /// `non_field_errors`, then `field: message` pairs. Otherwise the raw body
    /// or the status reason is used.
    pub fn from_body(status: u16, reason: Option<&str>, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| message_from_json(&json))
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| reason.unwrap_or("Unknown error").to_string());
        ApiError { status, message }
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(text_of).collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn message_from_json(json: &Value) -> Option<String> {
    let obj = json.as_object()?;
    if let Some(detail) = obj.get("detail").and_then(text_of) {
        return Some(detail);
    }
    if let Some(errors) = obj.get("non_field_errors").and_then(text_of) {
        return Some(errors);
    }
    let fields: Vec<String> = obj
        .iter()
        .filter_map(|(key, value)| text_of(value).map(|text| format!("{}: {}", key, text)))
        .collect();
    (!fields.is_empty()).then(|| fields.join("; "))
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential file {} is malformed: {reason}", .path.display())]
    Credentials { path: PathBuf, reason: String },

    #[error("Resource is missing the `{0}` field")]
    MissingField(&'static str),
}

impl Error {
    /// HTTP status, when the error came from an API response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(e) => Some(e.status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
