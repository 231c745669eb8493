use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::language::Language;

/// Closed set of FAQ categories. Overlaps, but is not identical to, the
/// chat intent vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FaqCategory {
    General,
    Academics,
    Admissions,
    Fees,
    Scholarships,
    Facilities,
    Placements,
    Events,
    Library,
    Hostel,
    Transport,
    Contact,
}

impl FaqCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaqCategory::General => "general",
            FaqCategory::Academics => "academics",
            FaqCategory::Admissions => "admissions",
            FaqCategory::Fees => "fees",
            FaqCategory::Scholarships => "scholarships",
            FaqCategory::Facilities => "facilities",
            FaqCategory::Placements => "placements",
            FaqCategory::Events => "events",
            FaqCategory::Library => "library",
            FaqCategory::Hostel => "hostel",
            FaqCategory::Transport => "transport",
            FaqCategory::Contact => "contact",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "general" => Some(FaqCategory::General),
            "academics" => Some(FaqCategory::Academics),
            "admissions" => Some(FaqCategory::Admissions),
            "fees" => Some(FaqCategory::Fees),
            "scholarships" => Some(FaqCategory::Scholarships),
            "facilities" => Some(FaqCategory::Facilities),
            "placements" => Some(FaqCategory::Placements),
            "events" => Some(FaqCategory::Events),
            "library" => Some(FaqCategory::Library),
            "hostel" => Some(FaqCategory::Hostel),
            "transport" => Some(FaqCategory::Transport),
            "contact" => Some(FaqCategory::Contact),
            _ => None,
        }
    }
}

/// Stored question/answer pair searchable by category and language.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Faq {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub language: Language,
    pub category: FaqCategory,
    pub keywords: Vec<String>,
    pub is_active: bool,
    /// Incremented each time the chat pipeline serves this FAQ.
    pub access_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
