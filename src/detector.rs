//! Tool call detection
//!
//! Classifies a completion result as either a final answer or a pending tool
//! invocation. Only the first requested tool call is returned; later ones in
//! the same result are ignored.

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::CoachError;
use crate::llm::{CompletionResult, ToolCall};
use crate::models::PendingToolCall;
use crate::tools::{default_tools, TransactionQuery, GET_USER_TRANSACTIONS};
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    NoToolNeeded(String),
    ToolRequested(PendingToolCall),
}

pub struct ToolCallDetector;

impl ToolCallDetector {
    pub fn detect(result: &CompletionResult) -> Result<Detection> {
        let message = result.message().ok_or_else(|| {
            CoachError::upstream(format!("Completion {} contained no choices", result.id))
        })?;

        let calls = message.tool_calls();
        if let Some(call) = calls.first() {
            if calls.len() > 1 {
                warn!(
                    response_id = %result.id,
                    ignored = calls.len() - 1,
                    "Completion requested several tool calls; only the first is forwarded"
                );
            }

            let pending = Self::pending_call(&result.id, call)?;
            info!(
                response_id = %pending.response_id,
                tool_call_id = %pending.tool_call_id,
                tool_name = %pending.tool_name,
                "Tool call detected"
            );
            return Ok(Detection::ToolRequested(pending));
        }

        match message.content.as_deref().map(str::trim) {
            Some(answer) if !answer.is_empty() => {
                Ok(Detection::NoToolNeeded(message.content.clone().unwrap_or_default()))
            }
            _ => Err(CoachError::upstream(format!(
                "Completion {} contained neither a tool call nor an answer",
                result.id
            ))),
        }
    }

    fn pending_call(response_id: &str, call: &ToolCall) -> Result<PendingToolCall> {
        let tool_arguments = parse_arguments(&call.function.arguments)?;

        if call.function.name == GET_USER_TRANSACTIONS {
            TransactionQuery::from_arguments(&tool_arguments)?;
        } else if !default_tools().contains(&call.function.name) {
            warn!(tool_name = %call.function.name, "LLM requested an undeclared tool");
        }

        Ok(PendingToolCall {
            response_id: response_id.to_string(),
            tool_call_id: call.id.clone(),
            tool_name: call.function.name.clone(),
            tool_arguments,
        })
    }
}

/// Parse a serialized argument payload into a key-value mapping.
fn parse_arguments(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CoachError::MalformedToolArguments(format!(
            "expected a JSON object, got {}",
            other
        ))),
        Err(e) => Err(CoachError::MalformedToolArguments(e.to_string())),
    }
}
