use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::api::types::*;
use crate::api::AppState;
use crate::errors::AppError;

fn internal(e: &AppError) -> Response {
    error!(action = "analytics_query_failed", error = %e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
        .into_response()
}

/// Time-windowed session analytics.
#[utoipa::path(get, path = "/api/analytics/chats", params(AnalyticsQuery),
    responses((status = 200, body = ChatAnalyticsResponse)))]
pub async fn chats(State(state): State<AppState>, Query(q): Query<AnalyticsQuery>) -> Response {
    let result: crate::errors::Result<ChatAnalytics> = async {
        let total_sessions = state
            .db
            .count_sessions(q.start_date, q.end_date, q.language, false)
            .await?;
        let active_sessions = state
            .db
            .count_sessions(q.start_date, q.end_date, q.language, true)
            .await?;
        let language_distribution = state
            .db
            .session_language_distribution(q.start_date, q.end_date)
            .await?
            .into_iter()
            .map(|(language, count)| LanguageCount { language, count })
            .collect();
        let daily_stats = state
            .db
            .daily_session_stats(q.start_date, q.end_date)
            .await?
            .into_iter()
            .map(|(date, sessions, messages)| DailyStat {
                date,
                sessions,
                messages,
            })
            .collect();
        let average_session_duration = state
            .db
            .average_session_duration_secs(q.start_date, q.end_date)
            .await?;

        Ok(ChatAnalytics {
            total_sessions,
            active_sessions,
            language_distribution,
            daily_stats,
            average_session_duration,
        })
    }
    .await;

    match result {
        Ok(analytics) => (
            StatusCode::OK,
            Json(ChatAnalyticsResponse {
                success: true,
                analytics,
            }),
        )
            .into_response(),
        Err(e) => internal(&e),
    }
}

/// Message volume and intent distributions.
#[utoipa::path(get, path = "/api/analytics/messages", params(AnalyticsQuery),
    responses((status = 200, body = MessageAnalyticsResponse)))]
pub async fn messages(State(state): State<AppState>, Query(q): Query<AnalyticsQuery>) -> Response {
    let result: crate::errors::Result<MessageAnalytics> = async {
        let message_by_sender = state
            .db
            .message_counts_by_sender(q.start_date, q.end_date, q.language)
            .await?
            .into_iter()
            .map(|(sender, count)| SenderCount { sender, count })
            .collect();
        let daily_messages = state
            .db
            .daily_message_counts(q.start_date, q.end_date)
            .await?
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect();
        let common_intents = state
            .db
            .common_intents(10)
            .await?
            .into_iter()
            .map(|(intent, count)| IntentCount { intent, count })
            .collect();

        Ok(MessageAnalytics {
            message_by_sender,
            daily_messages,
            common_intents,
        })
    }
    .await;

    match result {
        Ok(analytics) => (
            StatusCode::OK,
            Json(MessageAnalyticsResponse {
                success: true,
                analytics,
            }),
        )
            .into_response(),
        Err(e) => internal(&e),
    }
}

/// Rating and feedback aggregates over ended sessions.
#[utoipa::path(get, path = "/api/analytics/satisfaction", params(AnalyticsQuery),
    responses((status = 200, body = SatisfactionResponse)))]
pub async fn satisfaction(
    State(state): State<AppState>,
    Query(q): Query<AnalyticsQuery>,
) -> Response {
    let result: crate::errors::Result<SatisfactionAnalytics> = async {
        let rating_distribution: Vec<RatingCount> = state
            .db
            .rating_distribution(q.start_date, q.end_date)
            .await?
            .into_iter()
            .map(|(rating, count)| RatingCount { rating, count })
            .collect();
        let average_rating = state.db.average_rating().await?;
        let total_ratings = rating_distribution.iter().map(|r| r.count).sum();
        let feedback_count = state.db.feedback_count().await?;

        Ok(SatisfactionAnalytics {
            rating_distribution,
            average_rating,
            total_ratings,
            feedback_count,
        })
    }
    .await;

    match result {
        Ok(analytics) => (
            StatusCode::OK,
            Json(SatisfactionResponse {
                success: true,
                analytics,
            }),
        )
            .into_response(),
        Err(e) => internal(&e),
    }
}
