//! REST API Server for the finance agent router
//!
//! Exposes the routing loop over HTTP, one session per thread id

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::agent::Orchestrator;
use crate::error::OrchestrationError;
use crate::models::Message;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    /// Continue this session; a new one is started when absent
    pub thread_id: Option<String>,
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub thread_id: String,
    pub answer: Option<String>,
    pub messages: Vec<Message>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

fn status_for(error: &OrchestrationError) -> StatusCode {
    match error {
        // the decision procedure misbehaved, not this server
        OrchestrationError::InvalidRoute(_)
        | OrchestrationError::MaxStepsExceeded(_)
        | OrchestrationError::LlmError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let query = req.query.trim();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Query must not be empty".into())),
        );
    }

    let thread_id = req
        .thread_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(thread_id = %thread_id, "Received chat request: {}", query);

    match state.orchestrator.run(&thread_id, query).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(ChatResponse {
                thread_id: report.thread_id,
                answer: report.answer,
                messages: report.messages,
            })),
        ),
        Err(e) => {
            warn!(thread_id = %thread_id, error = %e, "Routing run failed");
            (
                status_for(&e),
                Json(ApiResponse::error(format!("Routing failed: {}", e))),
            )
        }
    }
}

/// =============================
/// Thread History Endpoint
/// =============================

async fn thread_handler(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.orchestrator.sessions().get(&thread_id).await {
        Ok(Some(session)) => {
            // a run holds the session lock until it finishes
            let snapshot = session
                .try_lock()
                .ok()
                .map(|conversation| ApiResponse::success(&*conversation));
            match snapshot {
                Some(response) => (StatusCode::OK, Json(response)),
                None => (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::error(format!(
                        "A run is in progress on thread {}",
                        thread_id
                    ))),
                ),
            }
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Unknown thread: {}", thread_id))),
        ),
        Err(e) => (status_for(&e), Json(ApiResponse::error(e.to_string()))),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/chat", post(chat_handler))
        .route("/api/v1/threads/:thread_id", get(thread_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
