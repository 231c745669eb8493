use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::info;

use crate::api::types::*;
use crate::api::AppState;

/// Probe the external RAG service and report its availability.
#[utoipa::path(get, path = "/api/rag/health",
    responses((status = 200, body = RagHealthEnvelope)))]
pub async fn health(State(state): State<AppState>) -> Json<RagHealthEnvelope> {
    let rag_service = state.rag.health().await;
    Json(RagHealthEnvelope {
        status: "success".to_string(),
        rag_service,
        timestamp: Utc::now(),
    })
}

/// Direct chat through the external RAG service. Degrades to a local
/// apology when the service is unreachable; never errors the request for
/// remote failures.
#[utoipa::path(post, path = "/api/rag/chat", request_body = RagChatRequest,
    responses((status = 200, body = RagChatEnvelope), (status = 400, body = ErrorResponse)))]
pub async fn chat(State(state): State<AppState>, Json(req): Json<RagChatRequest>) -> Response {
    let message = match req.message.as_deref() {
        Some(m) if !m.trim().is_empty() => m,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Message is required")),
            )
                .into_response();
        }
    };
    let user_id = req.user_id.as_deref().unwrap_or("test-user");
    let language = req.language.unwrap_or_default();

    let reply = state.rag.send_message(message, user_id, language).await;
    info!(action = "rag_chat", user_id = %user_id, rag_enabled = reply.rag_enabled);

    (
        StatusCode::OK,
        Json(RagChatEnvelope {
            status: "success".to_string(),
            data: reply,
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}
