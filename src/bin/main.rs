//! One-shot driver for the two-phase protocol.
//!
//! Usage: coach <userId> <question...>
//!
//! Plays the caller's part: when the assistant suspends on a tool call, the
//! transactions are fetched from the configured source and submitted back.

use money_coach_orchestrator::{
    agent::Orchestrator,
    config::CoachConfig,
    llm::OpenAiClient,
    models::{AssistantOutcome, AssistantRequest, ToolOutputSubmission},
    tools::{RestTransactionSource, TransactionQuery, TransactionSource, GET_USER_TRANSACTIONS},
    CoachError,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoachConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = config?;

    let mut args = std::env::args().skip(1);
    let (Some(user_id), question) = (args.next(), args.collect::<Vec<_>>().join(" ")) else {
        eprintln!("Usage: coach <userId> <question...>");
        std::process::exit(2);
    };

    let llm = OpenAiClient::new(&config.openai_api_key, &config.openai_base_url, &config.model)?;
    let orchestrator = Orchestrator::new(Arc::new(llm));

    info!(user_id = %user_id, "Asking assistant");

    let call = match orchestrator.ask(AssistantRequest::new(question, user_id)).await? {
        AssistantOutcome::Answered(answer) => {
            println!("{}", answer);
            return Ok(());
        }
        AssistantOutcome::Suspended(call) => call,
    };

    println!("=== TOOL REQUESTED ===");
    println!("Tool: {}", call.tool_name);
    println!("Arguments: {}", serde_json::Value::Object(call.tool_arguments.clone()));

    if call.tool_name != GET_USER_TRANSACTIONS {
        return Err(CoachError::upstream(format!("Cannot execute tool {}", call.tool_name)).into());
    }

    let tx = config.transactions.as_ref().ok_or_else(|| {
        CoachError::Config("TRANSACTIONS_API_URL / TRANSACTIONS_API_KEY not set".to_string())
    })?;
    let source = RestTransactionSource::new(&tx.base_url, &tx.api_key)?;

    let query = TransactionQuery::from_arguments(&call.tool_arguments)?;
    let payload = source.fetch_transactions(&query.user_id).await?;
    println!("Fetched {} transactions", payload.transactions.len());

    let ack = orchestrator
        .finalize_validated(ToolOutputSubmission {
            response_id: call.response_id,
            tool_call_id: call.tool_call_id,
            transactions: payload.transactions,
        })
        .await?;

    println!("\n=== TOOL OUTPUT SUBMITTED ===");
    println!("{}", serde_json::to_string_pretty(&ack)?);

    Ok(())
}
