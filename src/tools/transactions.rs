//! Transaction data source
//!
//! The orchestrator never fetches transactions itself. This source backs the
//! passthrough endpoint and the `coach` driver, which plays the caller's part
//! of the tool protocol.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use crate::error::{upstream_error_message, CoachError};
use crate::models::TransactionsPayload;
use crate::Result;

#[async_trait::async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_transactions(&self, user_id: &str) -> Result<TransactionsPayload>;
}

/// REST-backed source: `GET {base}/transactions?user_id=eq.{id}`
#[derive(Clone)]
pub struct RestTransactionSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestTransactionSource {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl TransactionSource for RestTransactionSource {
    async fn fetch_transactions(&self, user_id: &str) -> Result<TransactionsPayload> {
        let url = format!("{}/transactions", self.base_url);
        let filter = format!("eq.{}", user_id);

        info!(user_id = %user_id, "Fetching transactions");

        let response = self
            .client
            .get(url)
            .query(&[("user_id", filter.as_str())])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                error!("Transaction source request failed: {}", e);
                CoachError::upstream(format!("Transaction source request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CoachError::upstream(format!("Failed to read transaction source response: {}", e))
        })?;

        if !status.is_success() {
            error!(status = %status, "Transaction source returned an error");
            return Err(CoachError::upstream(upstream_error_message(&body)));
        }

        let transactions = match serde_json::from_str::<Value>(&body)? {
            Value::Array(items) => items,
            other => {
                return Err(CoachError::upstream(format!(
                    "Transaction source returned a non-array body: {}",
                    other
                )))
            }
        };

        info!(user_id = %user_id, count = transactions.len(), "Transactions fetched");

        Ok(TransactionsPayload { transactions })
    }
}

/// Fixed-response source for development and tests
pub struct MockTransactionSource {
    response: std::result::Result<Vec<Value>, String>,
}

impl MockTransactionSource {
    pub fn with_transactions(transactions: Vec<Value>) -> Self {
        Self {
            response: Ok(transactions),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl TransactionSource for MockTransactionSource {
    async fn fetch_transactions(&self, _user_id: &str) -> Result<TransactionsPayload> {
        match &self.response {
            Ok(transactions) => Ok(TransactionsPayload {
                transactions: transactions.clone(),
            }),
            Err(message) => Err(CoachError::upstream(message.clone())),
        }
    }
}
