//! HTTP surface for the chat agent.

use crate::agent::{new_thread_id, Agent, ToolError};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub thread_id: String,
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct TopProductsRequest {
    pub query: String,
}

/// Build the axum Router with all endpoints.
pub fn router(agent: Arc<Agent>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/chat", post(handle_chat))
        .route("/api/v1/top-products", post(handle_top_products))
        .with_state(agent)
}

/// Serves the router until the process is stopped.
pub async fn start(host: &str, port: u16, agent: Arc<Agent>) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Chat server listening on http://{}", addr);
    axum::serve(listener, router(agent)).await.context("Server stopped unexpectedly")
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn handle_chat(
    State(agent): State<Arc<Agent>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let thread_id = request
        .thread_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(new_thread_id);

    let reply = agent.respond(&thread_id, &request.message).await;
    Json(ChatResponse { thread_id, reply })
}

async fn handle_top_products(
    State(agent): State<Arc<Agent>>,
    Json(request): Json<TopProductsRequest>,
) -> Response {
    match agent.advisor().top_products(&request.query).await {
        Ok(records) => Json(records).into_response(),
        Err(e @ ToolError::Interpret(_)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": e.to_string() })))
                .into_response()
        }
        Err(e @ ToolError::Ranking(_)) => {
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}
