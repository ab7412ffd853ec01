//! LLM conversation service interface
//!
//! Wire types follow the chat-completions format with function tools. The
//! service must retain a completed turn (`store: true`) so a later tool
//! output submission can address it by response id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;

use crate::error::CoachError;
use crate::models::{ConversationMessage, TransactionsPayload};
use crate::tools::{ToolDefinition, ToolSet};
use crate::Result;

pub mod openai;
pub use openai::OpenAiClient;

/// Trait for the upstream LLM service
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Model name sent with every completion request
    fn model(&self) -> &str;

    async fn create_completion(&self, request: &CompletionRequest) -> Result<CompletionResult>;

    /// Resume a stored turn with tool results. Returns the upstream body.
    async fn submit_tool_outputs(&self, response_id: &str, outputs: &ToolOutputs) -> Result<Value>;
}

//
// ================= Requests =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ToolDefinition,
}

impl From<&ToolDefinition> for FunctionTool {
    fn from(definition: &ToolDefinition) -> Self {
        Self {
            kind: "function".to_string(),
            function: definition.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<FunctionTool>,
    pub tool_choice: String,
    pub store: bool,
}

impl CompletionRequest {
    /// Non-streaming request with automatic tool selection and storage on.
    pub fn new(model: &str, messages: Vec<ConversationMessage>, tools: &ToolSet) -> Self {
        Self {
            model: model.to_string(),
            messages,
            tools: tools.definitions().iter().map(FunctionTool::from).collect(),
            tool_choice: "auto".to_string(),
            store: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: TransactionsPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutputs {
    pub tool_outputs: Vec<ToolOutput>,
}

impl ToolOutputs {
    pub fn single(tool_call_id: &str, transactions: Vec<Value>) -> Self {
        Self {
            tool_outputs: vec![ToolOutput {
                tool_call_id: tool_call_id.to_string(),
                output: TransactionsPayload { transactions },
            }],
        }
    }
}

//
// ================= Responses =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionResult {
    pub id: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    pub message: CompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

/// Requested function with its arguments as a serialized JSON object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

impl CompletionResult {
    pub fn answer(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            choices: vec![Choice {
                message: CompletionMessage {
                    content: Some(text.to_string()),
                    tool_calls: None,
                },
                finish_reason: Some("stop".to_string()),
            }],
        }
    }

    pub fn tool_call(id: &str, call_id: &str, name: &str, arguments: &str) -> Self {
        Self {
            id: id.to_string(),
            choices: vec![Choice {
                message: CompletionMessage {
                    content: None,
                    tool_calls: Some(vec![ToolCall {
                        id: call_id.to_string(),
                        kind: function_kind(),
                        function: FunctionCall {
                            name: name.to_string(),
                            arguments: arguments.to_string(),
                        },
                    }]),
                },
                finish_reason: Some("tool_calls".to_string()),
            }],
        }
    }

    /// Message of the first choice, if any.
    pub fn message(&self) -> Option<&CompletionMessage> {
        self.choices.first().map(|c| &c.message)
    }
}

impl CompletionMessage {
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

//
// ================= Mock =================
//

/// Scripted LLM service for development & testing.
/// Records every request it receives.
pub struct MockLlm {
    completion: std::result::Result<CompletionResult, String>,
    ack: std::result::Result<Value, String>,
    completions: Mutex<Vec<CompletionRequest>>,
    submissions: Mutex<Vec<(String, ToolOutputs)>>,
}

impl MockLlm {
    pub fn new(completion: CompletionResult) -> Self {
        Self {
            completion: Ok(completion),
            ack: Ok(serde_json::json!({ "status": "completed" })),
            completions: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(text: &str) -> Self {
        Self::new(CompletionResult::answer("resp_mock", text))
    }

    pub fn requesting_tool(call_id: &str, name: &str, arguments: &str) -> Self {
        Self::new(CompletionResult::tool_call("resp_mock", call_id, name, arguments))
    }

    pub fn failing(message: &str) -> Self {
        Self {
            completion: Err(message.to_string()),
            ..Self::answering("")
        }
    }

    pub fn with_ack(mut self, ack: Value) -> Self {
        self.ack = Ok(ack);
        self
    }

    pub fn with_ack_error(mut self, message: &str) -> Self {
        self.ack = Err(message.to_string());
        self
    }

    pub fn completion_requests(&self) -> Vec<CompletionRequest> {
        self.completions
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn submissions(&self) -> Vec<(String, ToolOutputs)> {
        self.submissions
            .lock()
            .map(|submissions| submissions.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlm {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn create_completion(&self, request: &CompletionRequest) -> Result<CompletionResult> {
        if let Ok(mut requests) = self.completions.lock() {
            requests.push(request.clone());
        }
        self.completion.clone().map_err(CoachError::upstream)
    }

    async fn submit_tool_outputs(&self, response_id: &str, outputs: &ToolOutputs) -> Result<Value> {
        if let Ok(mut submissions) = self.submissions.lock() {
            submissions.push((response_id.to_string(), outputs.clone()));
        }
        self.ack.clone().map_err(CoachError::upstream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::default_tools;
    use serde_json::json;

    #[test]
    fn test_completion_request_serialization() {
        let request = CompletionRequest::new(
            "gpt-4o-mini",
            vec![ConversationMessage::user("What is my balance?")],
            default_tools(),
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tool_choice"], json!("auto"));
        assert_eq!(value["store"], json!(true));
        assert_eq!(value["tools"][0]["type"], json!("function"));
        assert_eq!(value["tools"][0]["function"]["name"], json!("get_user_transactions"));
        assert_eq!(value["messages"][0]["role"], json!("user"));
    }

    #[test]
    fn test_completion_result_with_null_tool_calls() {
        let result: CompletionResult = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi!", "tool_calls": null},
                "finish_reason": "stop"
            }]
        }))
        .unwrap();

        let message = result.message().unwrap();
        assert!(message.tool_calls().is_empty());
        assert_eq!(message.content.as_deref(), Some("Hi!"));
    }

    #[test]
    fn test_tool_outputs_shape() {
        let outputs = ToolOutputs::single("call_1", vec![json!({"amount": 42.5})]);
        assert_eq!(
            serde_json::to_value(&outputs).unwrap(),
            json!({
                "tool_outputs": [{
                    "tool_call_id": "call_1",
                    "output": {"transactions": [{"amount": 42.5}]}
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let llm = MockLlm::answering("ok").with_ack_error("gone");
        let request = CompletionRequest::new(llm.model(), vec![], default_tools());

        assert!(llm.create_completion(&request).await.is_ok());
        assert!(llm
            .submit_tool_outputs("resp_1", &ToolOutputs::single("call_1", vec![]))
            .await
            .is_err());

        assert_eq!(llm.completion_requests().len(), 1);
        assert_eq!(llm.submissions()[0].0, "resp_1");
    }
}
