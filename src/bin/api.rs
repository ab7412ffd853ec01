use money_coach_orchestrator::{
    agent::Orchestrator,
    api::start_server,
    config::CoachConfig,
    llm::OpenAiClient,
    tools::{RestTransactionSource, TransactionSource},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables before the filter reads RUST_LOG
    let config = CoachConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config?;

    info!("Money Coach Orchestrator - API Server");
    info!(port = config.port, model = %config.model, "Configuration loaded");

    let llm = OpenAiClient::new(&config.openai_api_key, &config.openai_base_url, &config.model)?;
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(llm)));

    let transactions: Option<Arc<dyn TransactionSource>> = match &config.transactions {
        Some(tx) => {
            let source: Arc<dyn TransactionSource> =
                Arc::new(RestTransactionSource::new(&tx.base_url, &tx.api_key)?);
            Some(source)
        }
        None => {
            warn!("TRANSACTIONS_API_URL / TRANSACTIONS_API_KEY not set; /transactions is disabled");
            None
        }
    };

    start_server(orchestrator, transactions, config.port).await?;

    Ok(())
}
