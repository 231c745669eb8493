use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::types::*;
use crate::api::AppState;
use crate::errors::AppError;
use crate::utils::validation::Validator;

fn internal(e: &AppError) -> Response {
    error!(action = "admin_query_failed", error = %e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
        .into_response()
}

/// Aggregate chatbot statistics for the admin dashboard.
#[utoipa::path(get, path = "/api/admin/dashboard",
    responses((status = 200, body = AdminDashboardResponse)))]
pub async fn dashboard(State(state): State<AppState>) -> Response {
    let today = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();

    let result: crate::errors::Result<AdminAnalytics> = async {
        let total = state.db.count_sessions(None, None, None, false).await?;
        let active = state.db.count_sessions(None, None, None, true).await?;
        let today_sessions = state.db.count_sessions(Some(today), None, None, false).await?;

        let total_messages = state.db.count_messages(None).await?;
        let today_messages = state.db.count_messages(Some(today)).await?;

        let languages = state
            .db
            .session_language_distribution(None, None)
            .await?
            .into_iter()
            .map(|(language, count)| LanguageCount { language, count })
            .collect();

        let popular_faqs = state.db.top_faqs(5).await?;
        let average = state.db.average_session_duration_secs(None, None).await?;

        Ok(AdminAnalytics {
            sessions: SessionStats {
                total,
                active,
                today: today_sessions,
            },
            messages: MessageStats {
                total: total_messages,
                today: today_messages,
            },
            languages,
            popular_faqs,
            average_session_duration: average.round() as i64,
        })
    }
    .await;

    match result {
        Ok(analytics) => (
            StatusCode::OK,
            Json(AdminDashboardResponse {
                success: true,
                analytics,
            }),
        )
            .into_response(),
        Err(e) => internal(&e),
    }
}

#[utoipa::path(get, path = "/api/admin/faqs", params(FaqListQuery),
    responses((status = 200, body = FaqListResponse)))]
pub async fn list_faqs(
    State(state): State<AppState>,
    Query(query): Query<FaqListQuery>,
) -> Response {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    match state.db.list_faqs(query.language, page, limit).await {
        Ok((faqs, total)) => {
            let total_pages = (total + limit - 1) / limit;
            (
                StatusCode::OK,
                Json(FaqListResponse {
                    success: true,
                    faqs,
                    pagination: FaqPagination {
                        current_page: page,
                        total_pages,
                        total_faqs: total,
                        has_next: page * limit < total,
                        has_prev: page > 1,
                    },
                }),
            )
                .into_response()
        }
        Err(e) => internal(&e),
    }
}

#[utoipa::path(post, path = "/api/admin/faqs", request_body = FaqPayload,
    responses((status = 201, body = FaqResponse), (status = 400, body = ErrorResponse)))]
pub async fn create_faq(
    State(state): State<AppState>,
    Json(payload): Json<FaqPayload>,
) -> Response {
    if let Err(e) = Validator::validate_faq_question(&payload.question)
        .and_then(|_| Validator::validate_faq_answer(&payload.answer))
    {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response();
    }

    match state
        .db
        .create_faq(
            &payload.question,
            &payload.answer,
            payload.language,
            payload.category,
            &payload.keywords,
        )
        .await
    {
        Ok(faq) => {
            info!(action = "faq_created", faq_id = %faq.id);
            (
                StatusCode::CREATED,
                Json(FaqResponse {
                    success: true,
                    message: "FAQ created successfully".to_string(),
                    faq,
                }),
            )
                .into_response()
        }
        Err(e) => internal(&e),
    }
}

#[utoipa::path(put, path = "/api/admin/faqs/{id}", request_body = FaqPayload,
    responses(
        (status = 200, body = FaqResponse),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ))]
pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FaqPayload>,
) -> Response {
    if let Err(e) = Validator::validate_faq_question(&payload.question)
        .and_then(|_| Validator::validate_faq_answer(&payload.answer))
    {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response();
    }

    match state
        .db
        .update_faq(
            &id,
            &payload.question,
            &payload.answer,
            payload.language,
            payload.category,
            &payload.keywords,
        )
        .await
    {
        Ok(Some(faq)) => {
            info!(action = "faq_updated", faq_id = %id);
            (
                StatusCode::OK,
                Json(FaqResponse {
                    success: true,
                    message: "FAQ updated successfully".to_string(),
                    faq,
                }),
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("FAQ not found")),
        )
            .into_response(),
        Err(e) => internal(&e),
    }
}

#[utoipa::path(delete, path = "/api/admin/faqs/{id}",
    responses((status = 200, body = SimpleResponse), (status = 404, body = ErrorResponse)))]
pub async fn delete_faq(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.db.delete_faq(&id).await {
        Ok(true) => {
            info!(action = "faq_deleted", faq_id = %id);
            (
                StatusCode::OK,
                Json(SimpleResponse {
                    success: true,
                    message: "FAQ deleted successfully".to_string(),
                }),
            )
                .into_response()
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("FAQ not found")),
        )
            .into_response(),
        Err(e) => internal(&e),
    }
}
