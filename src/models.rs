//! Core data models for the money coach

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::dates::{resolve_range, DateRange};
use crate::error::CoachError;
use crate::Result;

//
// ================= Conversation =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Incoming question as it arrives on the wire. Every field is optional so
/// that missing values can be reported together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    pub input: Option<String>,
    pub user_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// A validated question with its date window resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRequest {
    pub input: String,
    pub user_id: String,
    pub range: DateRange,
}

impl AssistantRequest {
    pub fn new(input: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            input: Some(input.into()),
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn validate(self) -> Result<ConversationRequest> {
        let mut missing = Vec::new();
        if is_blank(&self.input) {
            missing.push("input");
        }
        if is_blank(&self.user_id) {
            missing.push("userId");
        }
        if !missing.is_empty() {
            return Err(missing_fields(&missing));
        }

        let range = resolve_range(self.start_date.as_deref(), self.end_date.as_deref())?;

        Ok(ConversationRequest {
            input: self.input.unwrap_or_default(),
            user_id: self.user_id.unwrap_or_default(),
            range,
        })
    }
}

//
// ================= Tool Calls =================
//

/// A tool invocation the LLM asked for, handed back to the caller.
///
/// The caller must echo `response_id` and `tool_call_id` when submitting the
/// tool output; nothing is kept server-side between the two calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingToolCall {
    pub response_id: String,
    pub tool_call_id: String,
    pub tool_name: String,
    pub tool_arguments: Map<String, Value>,
}

/// Result of the first round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantOutcome {
    Answered(String),
    Suspended(PendingToolCall),
}

impl fmt::Display for AssistantOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantOutcome::Answered(_) => write!(f, "answered"),
            AssistantOutcome::Suspended(call) => write!(f, "suspended on {}", call.tool_name),
        }
    }
}

//
// ================= Tool Output =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolOutputRequest {
    pub response_id: Option<String>,
    pub tool_call_id: Option<String>,
    pub transactions: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutputSubmission {
    pub response_id: String,
    pub tool_call_id: String,
    pub transactions: Vec<Value>,
}

impl ToolOutputRequest {
    pub fn validate(self) -> Result<ToolOutputSubmission> {
        let mut missing = Vec::new();
        if is_blank(&self.response_id) {
            missing.push("response_id");
        }
        if is_blank(&self.tool_call_id) {
            missing.push("tool_call_id");
        }
        let transactions = match self.transactions {
            Some(Value::Array(items)) => Some(items),
            _ => {
                missing.push("transactions");
                None
            }
        };
        if !missing.is_empty() {
            return Err(missing_fields(&missing));
        }

        Ok(ToolOutputSubmission {
            response_id: self.response_id.unwrap_or_default(),
            tool_call_id: self.tool_call_id.unwrap_or_default(),
            transactions: transactions.unwrap_or_default(),
        })
    }
}

/// Transaction records as the data source returns them. Records are opaque.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionsPayload {
    pub transactions: Vec<Value>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn missing_fields(fields: &[&str]) -> CoachError {
    CoachError::InvalidRequest(format!(
        "Missing required field(s): {}",
        fields.join(", ")
    ))
}
