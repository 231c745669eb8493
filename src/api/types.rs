use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::chat::intent::Intent;
use crate::chat::rag::RagHealth;
use crate::chat::ResponseSource;
use crate::models::announcement::Announcement;
use crate::models::academic::{Assignment, AttendanceRecord};
use crate::models::chat::Message;
use crate::models::event::{Event, Schedule};
use crate::models::faq::{Faq, FaqCategory};
use crate::models::fee::{FeePayment, FeeStructure};
use crate::models::language::{Language, LanguageInfo};
use crate::models::user::{
    Preferences, PrincipalDetails, Profile, StudentDetails, TeacherDetails, UserResponse, UserRole,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// ── chat ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: Uuid,
    pub language: Language,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserMessageView {
    pub id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BotMessageView {
    pub id: Uuid,
    pub content: String,
    pub language: Language,
    pub confidence: f64,
    pub intent: Intent,
    pub source: ResponseSource,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendMessageResponse {
    pub success: bool,
    pub user_message: UserMessageView,
    pub bot_response: BotMessageView,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_messages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub success: bool,
    pub messages: Vec<Message>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EndSessionRequest {
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SimpleResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LanguagesResponse {
    pub success: bool,
    pub languages: Vec<LanguageInfo>,
}

// ── admin ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStats {
    pub total: i64,
    pub active: i64,
    pub today: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageStats {
    pub total: i64,
    pub today: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LanguageCount {
    pub language: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminAnalytics {
    pub sessions: SessionStats,
    pub messages: MessageStats,
    pub languages: Vec<LanguageCount>,
    pub popular_faqs: Vec<Faq>,
    /// Average completed-session duration, in seconds.
    pub average_session_duration: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboardResponse {
    pub success: bool,
    pub analytics: AdminAnalytics,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FaqPayload {
    pub question: String,
    pub answer: String,
    pub language: Language,
    #[serde(default = "default_faq_category")]
    pub category: FaqCategory,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_faq_category() -> FaqCategory {
    FaqCategory::General
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FaqResponse {
    pub success: bool,
    pub message: String,
    pub faq: Faq,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct FaqListQuery {
    pub language: Option<Language>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FaqPagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_faqs: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FaqListResponse {
    pub success: bool,
    pub faqs: Vec<Faq>,
    pub pagination: FaqPagination,
}

// ── analytics ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
pub struct AnalyticsQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub language: Option<Language>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyStat {
    pub date: String,
    pub sessions: i64,
    pub messages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatAnalytics {
    pub total_sessions: i64,
    pub active_sessions: i64,
    pub language_distribution: Vec<LanguageCount>,
    pub daily_stats: Vec<DailyStat>,
    pub average_session_duration: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatAnalyticsResponse {
    pub success: bool,
    pub analytics: ChatAnalytics,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SenderCount {
    pub sender: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IntentCount {
    pub intent: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageAnalytics {
    pub message_by_sender: Vec<SenderCount>,
    pub daily_messages: Vec<DailyCount>,
    pub common_intents: Vec<IntentCount>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageAnalyticsResponse {
    pub success: bool,
    pub analytics: MessageAnalytics,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingCount {
    pub rating: i64,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SatisfactionAnalytics {
    pub rating_distribution: Vec<RatingCount>,
    pub average_rating: f64,
    pub total_ratings: i64,
    pub feedback_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SatisfactionResponse {
    pub success: bool,
    pub analytics: SatisfactionAnalytics,
}

// ── user auth ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub profile: Profile,
    #[serde(default)]
    pub student_details: Option<StudentDetails>,
    #[serde(default)]
    pub teacher_details: Option<TeacherDetails>,
    #[serde(default)]
    pub principal_details: Option<PrincipalDetails>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ── dashboards ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub course: String,
    pub semester: i64,
    pub batch: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentStats {
    pub attendance_percentage: i64,
    pub pending_assignments: i64,
    pub upcoming_events: i64,
    pub fee_status: String,
    pub total_fees: f64,
    pub paid_fees: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeeInfo {
    pub structure: Option<FeeStructure>,
    pub payments: Vec<FeePayment>,
    pub pending_amount: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentDashboard {
    pub student: StudentSummary,
    pub stats: StudentStats,
    pub announcements: Vec<Announcement>,
    pub upcoming_events: Vec<Event>,
    pub weekly_schedule: Vec<Schedule>,
    pub pending_assignments: Vec<Assignment>,
    pub recent_attendance: Vec<AttendanceRecord>,
    pub fee_info: FeeInfo,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub employee_id: String,
    pub department: String,
    pub subjects: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherStats {
    pub today_classes: i64,
    pub active_assignments: i64,
    pub pending_grading: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherDashboard {
    pub teacher: TeacherSummary,
    pub stats: TeacherStats,
    pub today_classes: Vec<Schedule>,
    pub recent_assignments: Vec<Assignment>,
    pub announcements: Vec<Announcement>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalStats {
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_announcements: i64,
    pub total_events: i64,
    pub total_fee_collected: f64,
    pub total_transactions: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseCount {
    pub course: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalDashboard {
    pub stats: PrincipalStats,
    pub recent_users: Vec<UserResponse>,
    pub recent_announcements: Vec<Announcement>,
    pub course_distribution: Vec<CourseCount>,
    pub monthly_registrations: Vec<MonthCount>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentDashboardResponse {
    pub success: bool,
    pub data: StudentDashboard,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherDashboardResponse {
    pub success: bool,
    pub data: TeacherDashboard,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalDashboardResponse {
    pub success: bool,
    pub data: PrincipalDashboard,
}

// ── rag ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct RagChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RagChatEnvelope {
    pub status: String,
    pub data: crate::chat::rag::RagReply,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RagHealthEnvelope {
    pub status: String,
    pub rag_service: RagHealth,
    pub timestamp: DateTime<Utc>,
}
