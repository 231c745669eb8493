use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::{Modify, OpenApi};
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::chat::rag::RagClient;
use crate::chat::ChatEngine;
use crate::config::AppConfig;
use crate::database::sqlite::SqliteDatabase;
use crate::realtime::RoomRegistry;
use crate::services::auth::AuthService;
use crate::utils::middleware::{rate_limit_middleware, request_id_middleware, RateLimiter};

mod admin_routes;
mod analytics_routes;
mod auth_routes;
mod chat_routes;
mod dashboard_routes;
mod rag_routes;
pub mod types;

/// Everything a request handler needs, injected through axum state.
/// No process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqliteDatabase>,
    pub config: Arc<AppConfig>,
    pub engine: Arc<ChatEngine>,
    pub auth: Arc<AuthService>,
    pub rag: Arc<RagClient>,
    pub rooms: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(db: Arc<SqliteDatabase>, config: AppConfig) -> Self {
        let engine = Arc::new(ChatEngine::new(db.clone()));
        let auth = Arc::new(AuthService::new(db.clone(), config.jwt_secret.clone()));
        let rag = Arc::new(RagClient::new(&config));
        Self {
            db,
            config: Arc::new(config),
            engine,
            auth,
            rag,
            rooms: Arc::new(RoomRegistry::new()),
        }
    }
}

/// Bearer-token extractor for `Authorization: Bearer ...` headers.
pub struct AuthBearer(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthBearer
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.headers.get(AUTHORIZATION) {
            if let Ok(auth_str) = auth.to_str() {
                if let Some(token) = auth_str.strip_prefix("Bearer ") {
                    return Ok(AuthBearer(token.to_string()));
                }
            }
        }
        Err((
            StatusCode::UNAUTHORIZED,
            "Missing or invalid Authorization header".to_string(),
        ))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        chat_routes::create_session,
        chat_routes::send_message,
        chat_routes::history,
        chat_routes::end_session,
        chat_routes::languages,
        admin_routes::dashboard,
        admin_routes::list_faqs,
        admin_routes::create_faq,
        admin_routes::update_faq,
        admin_routes::delete_faq,
        analytics_routes::chats,
        analytics_routes::messages,
        analytics_routes::satisfaction,
        auth_routes::register,
        auth_routes::login,
        auth_routes::get_profile,
        auth_routes::update_profile,
        auth_routes::change_password,
        auth_routes::logout,
        dashboard_routes::student,
        dashboard_routes::teacher,
        dashboard_routes::principal,
        rag_routes::health,
        rag_routes::chat,
    ),
    components(schemas(
        types::ErrorResponse,
        types::CreateSessionRequest,
        types::CreateSessionResponse,
        types::SendMessageRequest,
        types::SendMessageResponse,
        types::UserMessageView,
        types::BotMessageView,
        types::Pagination,
        types::HistoryResponse,
        types::EndSessionRequest,
        types::SimpleResponse,
        types::LanguagesResponse,
        types::AdminDashboardResponse,
        types::AdminAnalytics,
        types::SessionStats,
        types::MessageStats,
        types::LanguageCount,
        types::FaqPayload,
        types::FaqResponse,
        types::FaqListResponse,
        types::FaqPagination,
        types::ChatAnalyticsResponse,
        types::ChatAnalytics,
        types::DailyStat,
        types::MessageAnalyticsResponse,
        types::MessageAnalytics,
        types::SenderCount,
        types::DailyCount,
        types::IntentCount,
        types::SatisfactionResponse,
        types::SatisfactionAnalytics,
        types::RatingCount,
        types::RegisterRequest,
        types::LoginRequest,
        types::AuthResponse,
        types::ProfileResponse,
        types::UpdateProfileRequest,
        types::ChangePasswordRequest,
        types::StudentDashboardResponse,
        types::TeacherDashboardResponse,
        types::PrincipalDashboardResponse,
        types::StudentDashboard,
        types::TeacherDashboard,
        types::PrincipalDashboard,
        types::StudentSummary,
        types::StudentStats,
        types::FeeInfo,
        types::TeacherSummary,
        types::TeacherStats,
        types::PrincipalStats,
        types::CourseCount,
        types::MonthCount,
        types::RagChatRequest,
        types::RagChatEnvelope,
        types::RagHealthEnvelope,
        crate::chat::intent::Intent,
        crate::chat::ResponseSource,
        crate::chat::ChatReply,
        crate::chat::rag::RagReply,
        crate::chat::rag::RagHealth,
        crate::models::language::Language,
        crate::models::language::LanguageInfo,
        crate::models::chat::ChatSession,
        crate::models::chat::Message,
        crate::models::chat::MessageMetadata,
        crate::models::chat::SenderRole,
        crate::models::faq::Faq,
        crate::models::faq::FaqCategory,
        crate::models::user::UserRole,
        crate::models::user::UserResponse,
        crate::models::user::Profile,
        crate::models::user::Preferences,
        crate::models::user::Theme,
        crate::models::user::FeeStatus,
        crate::models::user::StudentDetails,
        crate::models::user::TeacherDetails,
        crate::models::user::PrincipalDetails,
        crate::models::announcement::Announcement,
        crate::models::announcement::TargetAudience,
        crate::models::event::Event,
        crate::models::event::EventStatus,
        crate::models::event::Schedule,
        crate::models::event::ScheduleStatus,
        crate::models::fee::FeeStructure,
        crate::models::fee::FeePayment,
        crate::models::fee::PaymentStatus,
        crate::models::academic::Assignment,
        crate::models::academic::AssignmentStatus,
        crate::models::academic::AttendanceRecord,
        crate::models::academic::AttendanceStatus,
    )),
    tags(
        (name = "Chat", description = "Chatbot session and message endpoints"),
        (name = "Admin", description = "FAQ management and aggregate statistics"),
        (name = "Analytics", description = "Time-windowed session and message analytics"),
        (name = "Auth", description = "Campus user authentication"),
        (name = "Dashboard", description = "Role-specific dashboards. Requires a Bearer token."),
        (name = "RAG", description = "External chatbot service proxy")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];
    let cors = match state.config.frontend_url.parse::<axum::http::HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(Any),
        Err(_) => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
    };

    let limiter = Arc::new(RateLimiter::new(state.config.rate_limit_per_sec, 1));
    let openapi = ApiDoc::openapi();

    let chat = Router::new()
        .route("/session", post(chat_routes::create_session))
        .route("/message", post(chat_routes::send_message))
        .route("/history/:session_id", get(chat_routes::history))
        .route("/session/:session_id/end", put(chat_routes::end_session))
        .route("/languages", get(chat_routes::languages));

    let admin = Router::new()
        .route("/dashboard", get(admin_routes::dashboard))
        .route("/faqs", get(admin_routes::list_faqs).post(admin_routes::create_faq))
        .route(
            "/faqs/:id",
            put(admin_routes::update_faq).delete(admin_routes::delete_faq),
        );

    let analytics = Router::new()
        .route("/chats", get(analytics_routes::chats))
        .route("/messages", get(analytics_routes::messages))
        .route("/satisfaction", get(analytics_routes::satisfaction));

    let user_auth = Router::new()
        .route("/register", post(auth_routes::register))
        .route("/login", post(auth_routes::login))
        .route(
            "/profile",
            get(auth_routes::get_profile).put(auth_routes::update_profile),
        )
        .route("/change-password", post(auth_routes::change_password))
        .route("/logout", post(auth_routes::logout));

    let dashboard = Router::new()
        .route("/student", get(dashboard_routes::student))
        .route("/teacher", get(dashboard_routes::teacher))
        .route("/principal", get(dashboard_routes::principal));

    let rag = Router::new()
        .route("/health", get(rag_routes::health))
        .route("/chat", post(rag_routes::chat));

    Router::new()
        .nest("/api/chat", chat)
        .nest("/api/admin", admin)
        .nest("/api/analytics", analytics)
        .nest("/api/user-auth", user_auth)
        .nest("/api/dashboard", dashboard)
        .nest("/api/rag", rag)
        .route("/ws", get(crate::realtime::ws_handler))
        .route("/health", get(health_check))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi.clone()))
        .merge(Redoc::with_url("/api/redoc", openapi))
        // Layer order: later layers wrap earlier ones, so the Extension
        // carrying the limiter sits outside the middleware that reads it.
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(Extension(limiter))
        .layer(cors)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "OK",
        "message": "Saarthi campus backend is running",
        "timestamp": Utc::now(),
    }))
}

/// Bind and serve until shutdown.
pub async fn start_http_server(state: AppState) {
    let addr: SocketAddr = format!("0.0.0.0:{}", state.config.port)
        .parse()
        .expect("invalid bind address");
    let app = build_router(state);

    info!(action = "server_starting", addr = %addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    info!(action = "server_listening", addr = %addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
