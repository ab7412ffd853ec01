//! OpenAI-compatible client for the LLM service
//!
//! Uses a long-lived reqwest::Client for connection pooling. No request
//! timeout is set; transport defaults apply.

use reqwest::{Client, Response, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use super::{CompletionRequest, CompletionResult, LlmService, ToolOutputs};
use crate::error::{upstream_error_message, CoachError};
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Reusable LLM client (connection-pooled)
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(CoachError::Config("OPENAI_API_KEY not configured".to_string()));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Base URL extended with `segments`, each percent-encoded as one path
    /// segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            CoachError::Config(format!("Invalid LLM base URL '{}': {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| CoachError::Config(format!("LLM base URL '{}' cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn post_json<T: serde::Serialize + ?Sized>(&self, url: Url, body: &T) -> Result<String> {
        let path = url.path().to_string();

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("LLM request to {} failed: {}", path, e);
                CoachError::upstream(format!("LLM request failed: {}", e))
            })?;

        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| CoachError::upstream(format!("Failed to read LLM response: {}", e)))?;

    if !status.is_success() {
        error!(status = %status, "LLM service returned an error");
        return Err(CoachError::upstream(upstream_error_message(&text)));
    }

    Ok(text)
}

#[async_trait::async_trait]
impl LlmService for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn create_completion(&self, request: &CompletionRequest) -> Result<CompletionResult> {
        info!(model = %request.model, messages = request.messages.len(), "Requesting completion");

        let url = self.endpoint(&["chat", "completions"])?;
        let text = self.post_json(url, request).await?;

        let result: CompletionResult = serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse completion: {}", e);
            CoachError::upstream(format!("Malformed completion response: {}", e))
        })?;

        info!(response_id = %result.id, "Completion received");
        Ok(result)
    }

    async fn submit_tool_outputs(&self, response_id: &str, outputs: &ToolOutputs) -> Result<Value> {
        info!(
            response_id = %response_id,
            outputs = outputs.tool_outputs.len(),
            "Submitting tool outputs"
        );

        let url = self.endpoint(&["responses", response_id, "tool_outputs"])?;
        let text = self.post_json(url, outputs).await?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(value),
            Err(_) => Ok(Value::String(text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConversationMessage;
    use crate::tools::default_tools;
    use httpmock::prelude::*;
    use serde_json::json;

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            DEFAULT_MODEL,
            vec![ConversationMessage::user("What was my total spending last month?")],
            default_tools(),
        )
    }

    #[test]
    fn test_missing_api_key() {
        let err = OpenAiClient::new("", DEFAULT_BASE_URL, DEFAULT_MODEL).err().unwrap();
        assert!(matches!(err, CoachError::Config(_)));
    }

    #[tokio::test]
    async fn test_create_completion() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(r#"{"tool_choice": "auto", "store": true}"#);
                then.status(200).json_body(json!({
                    "id": "chatcmpl-9",
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_1",
                                "type": "function",
                                "function": {
                                    "name": "get_user_transactions",
                                    "arguments": "{\"userId\":\"u1\"}"
                                }
                            }]
                        },
                        "finish_reason": "tool_calls"
                    }]
                }));
            })
            .await;

        let client = OpenAiClient::new("sk-test", &server.base_url(), DEFAULT_MODEL).unwrap();
        let result = client.create_completion(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.id, "chatcmpl-9");
        assert_eq!(result.message().unwrap().tool_calls()[0].id, "call_1");
    }

    #[tokio::test]
    async fn test_create_completion_upstream_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(401)
                    .json_body(json!({"error": {"message": "Incorrect API key provided"}}));
            })
            .await;

        let client = OpenAiClient::new("sk-bad", &server.base_url(), DEFAULT_MODEL).unwrap();
        let err = client.create_completion(&request()).await.unwrap_err();
        assert_eq!(err.details(), "Incorrect API key provided");
    }

    #[tokio::test]
    async fn test_submit_tool_outputs() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/responses/resp_1/tool_outputs")
                    .header("authorization", "Bearer sk-test")
                    .json_body(json!({
                        "tool_outputs": [{
                            "tool_call_id": "call_1",
                            "output": {"transactions": [{"amount": 42.5}]}
                        }]
                    }));
                then.status(200).json_body(json!({"id": "resp_2", "status": "completed"}));
            })
            .await;

        let client = OpenAiClient::new("sk-test", &format!("{}/", server.base_url()), DEFAULT_MODEL).unwrap();
        let ack = client
            .submit_tool_outputs("resp_1", &ToolOutputs::single("call_1", vec![json!({"amount": 42.5})]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(ack["status"], json!("completed"));
    }

    #[tokio::test]
    async fn test_submit_tool_outputs_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/responses/resp_x/tool_outputs");
                then.status(404).body("No response found with id resp_x");
            })
            .await;

        let client = OpenAiClient::new("sk-test", &server.base_url(), DEFAULT_MODEL).unwrap();
        let err = client
            .submit_tool_outputs("resp_x", &ToolOutputs::single("call_1", vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.details(), "No response found with id resp_x");
    }

    #[tokio::test]
    async fn test_submit_tool_outputs_encodes_response_id() {
        let server = MockServer::start_async().await;
        let truncated = server
            .mock_async(|when, then| {
                when.method(POST).path("/responses/resp_1");
                then.status(200).json_body(json!({"wrong_endpoint": true}));
            })
            .await;
        let keyed = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path_contains("/responses/resp_1")
                    .path_contains("/tool_outputs");
                then.status(200).json_body(json!({"status": "completed"}));
            })
            .await;

        let client = OpenAiClient::new("sk-test", &server.base_url(), DEFAULT_MODEL).unwrap();
        for response_id in ["resp_1#", "resp_1?x=1", "resp_1/../x"] {
            let ack = client
                .submit_tool_outputs(response_id, &ToolOutputs::single("call_1", vec![]))
                .await
                .unwrap();
            assert_eq!(ack["status"], json!("completed"));
        }

        assert_eq!(truncated.hits_async().await, 0);
        assert_eq!(keyed.hits_async().await, 3);
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = OpenAiClient::new("sk-test", "http://localhost:9000/v1/", DEFAULT_MODEL).unwrap();
        let url = client.endpoint(&["responses", "resp/1#", "tool_outputs"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/v1/responses/resp%2F1%23/tool_outputs");
    }

    #[tokio::test]
    async fn test_create_completion_transport_failure() {
        // nothing listens on port 1
        let client = OpenAiClient::new("sk-test", "http://127.0.0.1:1", DEFAULT_MODEL).unwrap();
        let err = client.create_completion(&request()).await.unwrap_err();
        assert!(matches!(err, CoachError::Upstream { .. }));
        assert!(err.details().starts_with("LLM request failed"));
    }
}
