//! Tool declarations offered to the LLM
//!
//! Tools are never executed here: the LLM asks for one, the request is
//! suspended back to the caller, and the caller supplies the output.
//! The declarations are process-wide and read-only.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

use crate::error::CoachError;
use crate::Result;

pub mod transactions;

pub use transactions::{MockTransactionSource, RestTransactionSource, TransactionSource};

pub const GET_USER_TRANSACTIONS: &str = "get_user_transactions";

/// A function declaration in the shape the LLM service expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Lookup over the declared tools
pub struct ToolSet {
    tools: Vec<ToolDefinition>,
}

impl ToolSet {
    pub fn new(tools: Vec<ToolDefinition>) -> Self {
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

fn transactions_tool() -> ToolDefinition {
    ToolDefinition {
        name: GET_USER_TRANSACTIONS.to_string(),
        description: "Fetch the user's transactions, optionally limited to a date range".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "userId": {
                    "type": "string",
                    "description": "ID of the user whose transactions to fetch"
                },
                "startDate": {
                    "type": ["string", "null"],
                    "description": "Inclusive start date, YYYY-MM-DD"
                },
                "endDate": {
                    "type": ["string", "null"],
                    "description": "Inclusive end date, YYYY-MM-DD"
                }
            },
            "required": ["userId"],
            "additionalProperties": false
        }),
    }
}

/// The tools offered on every completion request.
pub fn default_tools() -> &'static ToolSet {
    static TOOLS: OnceLock<ToolSet> = OnceLock::new();
    TOOLS.get_or_init(|| ToolSet::new(vec![transactions_tool()]))
}

/// Typed arguments of `get_user_transactions`. An explicit `null` date and an
/// absent one mean the same thing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionQuery {
    pub user_id: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl TransactionQuery {
    pub fn from_arguments(arguments: &Map<String, Value>) -> Result<Self> {
        let query: TransactionQuery = serde_json::from_value(Value::Object(arguments.clone()))
            .map_err(|e| {
                CoachError::MalformedToolArguments(format!(
                    "{} arguments do not match the declared schema: {}",
                    GET_USER_TRANSACTIONS, e
                ))
            })?;

        if query.user_id.trim().is_empty() {
            return Err(CoachError::MalformedToolArguments(format!(
                "{} requires a non-empty userId",
                GET_USER_TRANSACTIONS
            )));
        }

        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_default_tools() {
        let tools = default_tools();
        assert_eq!(tools.list(), vec![GET_USER_TRANSACTIONS]);

        let schema = &tools.get(GET_USER_TRANSACTIONS).unwrap().parameters;
        assert_eq!(schema["required"], json!(["userId"]));
        assert_eq!(schema["properties"]["startDate"]["type"], json!(["string", "null"]));
        assert!(!tools.contains("web_search"));
    }

    #[test]
    fn test_query_null_and_absent_dates() {
        let query = TransactionQuery::from_arguments(&args(json!({
            "userId": "u1",
            "startDate": "2024-01-01",
            "endDate": null
        })))
        .unwrap();
        assert_eq!(query.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(query.end_date, None);

        let query = TransactionQuery::from_arguments(&args(json!({"userId": "u1"}))).unwrap();
        assert_eq!(query.start_date, None);
    }

    #[test]
    fn test_query_requires_user_id() {
        let err = TransactionQuery::from_arguments(&args(json!({"startDate": "2024-01-01"})))
            .unwrap_err();
        assert!(matches!(err, CoachError::MalformedToolArguments(_)));

        let err = TransactionQuery::from_arguments(&args(json!({"userId": 7}))).unwrap_err();
        assert!(matches!(err, CoachError::MalformedToolArguments(_)));

        let err = TransactionQuery::from_arguments(&args(json!({"userId": ""}))).unwrap_err();
        assert!(matches!(err, CoachError::MalformedToolArguments(_)));
    }

    #[test]
    fn test_query_rejects_undeclared_keys() {
        let err = TransactionQuery::from_arguments(&args(json!({
            "userId": "u1",
            "category": "groceries"
        })))
        .unwrap_err();
        assert!(matches!(err, CoachError::MalformedToolArguments(_)));
    }
}
