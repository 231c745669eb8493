use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
    Principal,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::Principal => "principal",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "student" => Some(UserRole::Student),
            "teacher" => Some(UserRole::Teacher),
            "principal" => Some(UserRole::Principal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Paid,
    Pending,
    Overdue,
}

impl FeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeStatus::Paid => "paid",
            FeeStatus::Pending => "pending",
            FeeStatus::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentDetails {
    pub roll_number: String,
    pub course: String,
    pub semester: i64,
    pub batch: String,
    pub admission_year: i64,
    pub fee_status: FeeStatus,
    pub total_fees: f64,
    pub paid_fees: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeacherDetails {
    pub employee_id: String,
    pub department: String,
    pub subjects: Vec<String>,
    pub qualification: String,
    pub experience_years: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrincipalDetails {
    pub employee_id: String,
    pub joining_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Preferences {
    pub language: Language,
    pub notifications: bool,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: Language::En,
            notifications: true,
            theme: Theme::Light,
        }
    }
}

/// A campus user. Role-specific detail blocks are stored as JSON columns;
/// exactly the block matching `role` is expected to be present.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_details: Option<StudentDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_details: Option<TeacherDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_details: Option<PrincipalDetails>,
    pub preferences: Preferences,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, without credentials.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_details: Option<StudentDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_details: Option<TeacherDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_details: Option<PrincipalDetails>,
    pub preferences: Preferences,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            role: user.role,
            profile: user.profile,
            student_details: user.student_details,
            teacher_details: user.teacher_details,
            principal_details: user.principal_details,
            preferences: user.preferences,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
