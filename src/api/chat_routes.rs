use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::types::*;
use crate::api::AppState;
use crate::chat::ChatReply;
use crate::models::chat::{Message, MessageMetadata, SenderRole};
use crate::models::language::Language;
use crate::realtime::ServerEvent;
use crate::utils::validation::Validator;

/// Start a new chat session.
#[utoipa::path(post, path = "/api/chat/session", request_body = CreateSessionRequest,
    responses((status = 201, body = CreateSessionResponse)))]
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    let language = req.language.unwrap_or_default();
    match state.db.create_chat_session(req.user_id, language).await {
        Ok(session) => {
            info!(action = "chat_session_started", session_id = %session.id, language = %language);
            (
                StatusCode::CREATED,
                Json(CreateSessionResponse {
                    success: true,
                    session_id: session.id,
                    language: session.language,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(action = "chat_session_create_failed", error = %e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Could not create chat session")),
            )
                .into_response()
        }
    }
}

/// Post a message and get the bot's reply. Internal pipeline failures
/// surface as a 200 with an apology payload, not as an HTTP error.
#[utoipa::path(post, path = "/api/chat/message", request_body = SendMessageRequest,
    responses(
        (status = 200, body = SendMessageResponse),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ))]
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let (session_id, text) = match (req.session_id, req.message.as_deref()) {
        (Some(s), Some(m)) => (s, m),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Session ID and message are required")),
            )
                .into_response();
        }
    };
    if let Err(e) = Validator::validate_message(text) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response();
    }

    let session = match state.db.get_chat_session(&session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Chat session not found")),
            )
                .into_response();
        }
        Err(e) => {
            error!(action = "chat_session_lookup_failed", error = %e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Could not load chat session")),
            )
                .into_response();
        }
    };

    let started = Instant::now();
    let language = req.language.unwrap_or(session.language);
    let reply = state
        .engine
        .process_message(text, Some(language), session_id)
        .await;

    // Persistence of the two message rows and the session counters is
    // transactionally independent; a crash mid-sequence can leave a user
    // message with no bot message.
    let envelope = persist_exchange(&state, session_id, text, language, &reply, started).await;
    let response = match envelope {
        Ok(resp) => resp,
        Err(e) => {
            // Soft-fail: the chat surface answers with an apology instead
            // of an HTTP error.
            error!(action = "chat_persist_failed", session_id = %session_id, error = %e);
            let apology = crate::chat::error_reply(language);
            SendMessageResponse {
                success: true,
                user_message: UserMessageView {
                    id: Uuid::new_v4(),
                    content: text.to_string(),
                    timestamp: Utc::now(),
                },
                bot_response: BotMessageView {
                    id: Uuid::new_v4(),
                    content: apology.message,
                    language: apology.language,
                    confidence: apology.confidence,
                    intent: apology.intent,
                    source: apology.source,
                    timestamp: apology.timestamp,
                },
            }
        }
    };

    state.rooms.broadcast_to_room(
        &session_id.to_string(),
        &ServerEvent::receive_message(session_id, &reply),
    );

    info!(action = "chat_message_processed", session_id = %session_id);
    (StatusCode::OK, Json(response)).into_response()
}

async fn persist_exchange(
    state: &AppState,
    session_id: Uuid,
    text: &str,
    language: Language,
    reply: &ChatReply,
    started: Instant,
) -> crate::errors::Result<SendMessageResponse> {
    let user_message = Message {
        id: Uuid::new_v4(),
        session_id,
        content: text.to_string(),
        language,
        sender: SenderRole::User,
        timestamp: Utc::now(),
        metadata: None,
    };
    state.db.insert_message(&user_message).await?;

    // Stamped after the user message so history sorts user-then-bot.
    let bot_message = Message {
        id: Uuid::new_v4(),
        session_id,
        content: reply.message.clone(),
        language: reply.language,
        sender: SenderRole::Bot,
        timestamp: Utc::now(),
        metadata: Some(MessageMetadata {
            confidence: reply.confidence,
            intent: reply.intent.as_str().to_string(),
            entities: reply.entities.clone(),
            processing_time_ms: Some(started.elapsed().as_millis() as i64),
        }),
    };
    state.db.insert_message(&bot_message).await?;
    state.db.touch_chat_session(&session_id, 2).await?;

    Ok(SendMessageResponse {
        success: true,
        user_message: UserMessageView {
            id: user_message.id,
            content: user_message.content,
            timestamp: user_message.timestamp,
        },
        bot_response: BotMessageView {
            id: bot_message.id,
            content: bot_message.content,
            language: bot_message.language,
            confidence: reply.confidence,
            intent: reply.intent,
            source: reply.source,
            timestamp: bot_message.timestamp,
        },
    })
}

/// Paginated session history, ascending by timestamp.
#[utoipa::path(get, path = "/api/chat/history/{session_id}", params(HistoryQuery),
    responses((status = 200, body = HistoryResponse)))]
pub async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let messages = match state.db.messages_for_session(&session_id, page, limit).await {
        Ok(m) => m,
        Err(e) => {
            error!(action = "chat_history_failed", session_id = %session_id, error = %e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Could not load chat history")),
            )
                .into_response();
        }
    };
    let total = match state.db.count_messages_for_session(&session_id).await {
        Ok(n) => n,
        Err(e) => {
            error!(action = "chat_history_failed", session_id = %session_id, error = %e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Could not load chat history")),
            )
                .into_response();
        }
    };

    let total_pages = (total + limit - 1) / limit;
    (
        StatusCode::OK,
        Json(HistoryResponse {
            success: true,
            messages,
            pagination: Pagination {
                current_page: page,
                total_pages,
                total_messages: total,
                has_next: page * limit < total,
                has_prev: page > 1,
            },
        }),
    )
        .into_response()
}

/// End a session, optionally recording feedback and a 1-5 rating.
#[utoipa::path(put, path = "/api/chat/session/{session_id}/end", request_body = EndSessionRequest,
    responses(
        (status = 200, body = SimpleResponse),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ))]
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<EndSessionRequest>,
) -> Response {
    if let Some(feedback) = req.feedback.as_deref() {
        if let Err(e) = Validator::validate_feedback(feedback) {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string())))
                .into_response();
        }
    }
    if let Some(rating) = req.rating {
        if let Err(e) = Validator::validate_rating(rating) {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string())))
                .into_response();
        }
    }

    match state.db.get_chat_session(&session_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Chat session not found")),
            )
                .into_response();
        }
        Err(e) => {
            error!(action = "chat_session_lookup_failed", error = %e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Could not load chat session")),
            )
                .into_response();
        }
    }

    match state
        .db
        .end_chat_session(&session_id, req.feedback, req.rating)
        .await
    {
        Ok(()) => {
            info!(action = "chat_session_ended", session_id = %session_id);
            (
                StatusCode::OK,
                Json(SimpleResponse {
                    success: true,
                    message: "Chat session ended successfully".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(action = "chat_session_end_failed", session_id = %session_id, error = %e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Could not end chat session")),
            )
                .into_response()
        }
    }
}

/// The fixed three-language list every interface shares.
#[utoipa::path(get, path = "/api/chat/languages",
    responses((status = 200, body = LanguagesResponse)))]
pub async fn languages() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        success: true,
        languages: Language::all().iter().map(|l| l.info()).collect(),
    })
}
