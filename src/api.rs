//! REST API Server for the money coach
//!
//! POST /assistant            first round-trip (answer or suspend)
//! POST /finalize-tool-output second round-trip (resume with tool output)
//! GET  /transactions/:user   data source passthrough
//! GET  /health

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::agent::Orchestrator;
use crate::error::CoachError;
use crate::models::{
    AssistantOutcome, AssistantRequest, PendingToolCall, ToolOutputRequest, TransactionsPayload,
};
use crate::tools::TransactionSource;

/// =============================
/// Response Models
/// =============================

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AssistantResponse {
    Answer {
        success: bool,
        answer: String,
    },
    ToolRequired {
        requires_tool: bool,
        #[serde(flatten)]
        call: PendingToolCall,
    },
}

impl From<AssistantOutcome> for AssistantResponse {
    fn from(outcome: AssistantOutcome) -> Self {
        match outcome {
            AssistantOutcome::Answered(answer) => AssistantResponse::Answer {
                success: true,
                answer,
            },
            AssistantOutcome::Suspended(call) => AssistantResponse::ToolRequired {
                requires_tool: true,
                call,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub success: bool,
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// =============================
/// Error Envelope
/// =============================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// Invalid requests become 400 with their own message; everything else
    /// is a 500 carrying `summary` and the underlying message.
    pub fn from_coach(summary: &str, err: CoachError) -> Self {
        if err.is_invalid_request() {
            return Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody {
                    error: err.to_string(),
                    details: None,
                },
            };
        }

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                error: summary.to_string(),
                details: Some(err.details()),
            },
        }
    }

    fn bad_body(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self::from_coach(
            "",
            CoachError::InvalidRequest(format!("Invalid JSON body: {}", rejection.body_text())),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub transactions: Option<Arc<dyn TransactionSource>>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Two-Phase Protocol Endpoints
/// =============================

async fn assistant(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<AssistantRequest>, JsonRejection>,
) -> ApiResult<AssistantResponse> {
    let Json(req) = payload.map_err(ApiError::bad_body)?;

    let outcome = state
        .orchestrator
        .ask(req)
        .await
        .map_err(|e| ApiError::from_coach("Failed to get assistant response", e))?;

    info!("Assistant request {}", outcome);
    Ok(Json(outcome.into()))
}

async fn finalize_tool_output(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<ToolOutputRequest>, JsonRejection>,
) -> ApiResult<FinalizeResponse> {
    let Json(req) = payload.map_err(ApiError::bad_body)?;

    let data = state
        .orchestrator
        .finalize(req)
        .await
        .map_err(|e| ApiError::from_coach("Failed to submit tool output", e))?;

    Ok(Json(FinalizeResponse {
        success: true,
        data,
    }))
}

/// =============================
/// Transactions Passthrough
/// =============================

async fn user_transactions(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> ApiResult<TransactionsPayload> {
    const SUMMARY: &str = "Failed to fetch transactions";

    let source = state.transactions.as_ref().ok_or_else(|| {
        ApiError::from_coach(
            SUMMARY,
            CoachError::Config("TRANSACTIONS_API_URL / TRANSACTIONS_API_KEY not configured".to_string()),
        )
    })?;

    let payload = source
        .fetch_transactions(&user_id)
        .await
        .map_err(|e| ApiError::from_coach(SUMMARY, e))?;

    Ok(Json(payload))
}

/// =============================
/// Router
/// =============================

pub fn create_router(
    orchestrator: Arc<Orchestrator>,
    transactions: Option<Arc<dyn TransactionSource>>,
) -> Router {
    let state = ApiState {
        orchestrator,
        transactions,
    };

    Router::new()
        .route("/health", get(health))
        .route("/assistant", post(assistant))
        .route("/finalize-tool-output", post(finalize_tool_output))
        .route("/transactions/:user_id", get(user_transactions))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    transactions: Option<Arc<dyn TransactionSource>>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator, transactions);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
