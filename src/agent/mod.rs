//! Money coach orchestrator
//!
//! TWO-PHASE PROTOCOL:
//! ASK → COMPLETE → { ANSWERED | SUSPENDED }
//! SUSPENDED → (caller runs the tool) → FINALIZE → upstream ack
//!
//! Nothing is stored between the phases. A suspended call hands the caller
//! the `response_id`/`tool_call_id` pair, and the caller sends both back
//! with the tool output.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::detector::{Detection, ToolCallDetector};
use crate::llm::{CompletionRequest, LlmService, ToolOutputs};
use crate::models::{
    AssistantOutcome, AssistantRequest, ConversationRequest, ToolOutputRequest,
    ToolOutputSubmission,
};
use crate::tools::{default_tools, ToolSet};
use crate::Result;

pub struct Orchestrator {
    llm: Arc<dyn LlmService>,
    tools: &'static ToolSet,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self {
            llm,
            tools: default_tools(),
        }
    }

    /// First round-trip: validate, build the conversation, ask the LLM and
    /// either answer or suspend on a tool call.
    pub async fn ask(&self, request: AssistantRequest) -> Result<AssistantOutcome> {
        let request = request.validate()?;
        self.ask_validated(&request).await
    }

    pub async fn ask_validated(&self, request: &ConversationRequest) -> Result<AssistantOutcome> {
        info!(
            user_id = %request.user_id,
            start = %request.range.start_str(),
            end = %request.range.end_str(),
            "Awaiting completion"
        );

        let completion = CompletionRequest::new(self.llm.model(), request.messages(), self.tools);

        let result = self.llm.create_completion(&completion).await.map_err(|e| {
            error!(user_id = %request.user_id, "Completion failed: {}", e);
            e
        })?;

        match ToolCallDetector::detect(&result)? {
            Detection::NoToolNeeded(answer) => {
                info!(response_id = %result.id, "Answered without tools");
                Ok(AssistantOutcome::Answered(answer))
            }
            Detection::ToolRequested(call) => {
                info!(
                    response_id = %call.response_id,
                    tool_call_id = %call.tool_call_id,
                    tool_name = %call.tool_name,
                    "Suspending for tool execution"
                );
                Ok(AssistantOutcome::Suspended(call))
            }
        }
    }

    /// Second round-trip: forward the caller's tool output to the stored turn.
    pub async fn finalize(&self, request: ToolOutputRequest) -> Result<Value> {
        let submission = request.validate()?;
        self.finalize_validated(submission).await
    }

    pub async fn finalize_validated(&self, submission: ToolOutputSubmission) -> Result<Value> {
        info!(
            response_id = %submission.response_id,
            tool_call_id = %submission.tool_call_id,
            transactions = submission.transactions.len(),
            "Submitting tool output"
        );

        let outputs = ToolOutputs::single(&submission.tool_call_id, submission.transactions);

        let ack = self
            .llm
            .submit_tool_outputs(&submission.response_id, &outputs)
            .await
            .map_err(|e| {
                error!(response_id = %submission.response_id, "Tool output submission failed: {}", e);
                e
            })?;

        info!(response_id = %submission.response_id, "Tool output accepted");
        Ok(ack)
    }
}
