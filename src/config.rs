//! Process-wide configuration
//!
//! Read once at startup and shared read-only with every request handler.

use std::env;

use crate::error::CoachError;
use crate::llm::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::Result;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct TransactionsConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct CoachConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    pub transactions: Option<TransactionsConfig>,
    pub port: u16,
}

impl CoachConfig {
    /// Load from the environment, after an optional `.env` file.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| CoachError::Config("OPENAI_API_KEY not set".to_string()))?;

        let openai_base_url = get("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let transactions = match (get("TRANSACTIONS_API_URL"), get("TRANSACTIONS_API_KEY")) {
            (Some(base_url), Some(api_key)) => Some(TransactionsConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
            }),
            _ => None,
        };

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| CoachError::Config(format!("Invalid port: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url,
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            transactions,
            port,
        })
    }
}
