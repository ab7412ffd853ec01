//! Error types for the money coach orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, CoachError>;

#[derive(Error, Debug)]
pub enum CoachError {

    // =============================
    // Protocol Errors
    // =============================

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Upstream service error: {message}")]
    Upstream { message: String },

    #[error("Malformed tool arguments: {0}")]
    MalformedToolArguments(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CoachError {
    pub fn upstream(message: impl Into<String>) -> Self {
        CoachError::Upstream {
            message: message.into(),
        }
    }

    /// Message surfaced to HTTP callers in the `details` field.
    pub fn details(&self) -> String {
        match self {
            CoachError::InvalidRequest(msg)
            | CoachError::MalformedToolArguments(msg)
            | CoachError::Config(msg) => msg.clone(),
            CoachError::Upstream { message } => message.clone(),
            CoachError::Serialization(e) => e.to_string(),
            CoachError::Http(e) => e.to_string(),
        }
    }

    pub fn is_invalid_request(&self) -> bool {
        matches!(self, CoachError::InvalidRequest(_))
    }
}

/// Pull the most useful message out of an upstream error body.
///
/// OpenAI-style bodies look like `{"error": {"message": "..."}}`; some
/// services use a bare `{"message": "..."}` or `{"error": "..."}`. Anything
/// else is returned as raw text.
pub fn upstream_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .or_else(|| value.get("error"))
            .and_then(|v| v.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }
    body.trim().to_string()
}
