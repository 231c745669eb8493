use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Per course+semester fee breakdown for one academic year.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeeStructure {
    pub id: Uuid,
    pub course: String,
    pub semester: i64,
    pub academic_year: String,
    pub tuition_fee: f64,
    pub lab_fee: f64,
    pub library_fee: f64,
    pub other_fee: f64,
}

impl FeeStructure {
    pub fn total(&self) -> f64 {
        self.tuition_fee + self.lab_fee + self.library_fee + self.other_fee
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Pending,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "success" => Some(PaymentStatus::Success),
            "pending" => Some(PaymentStatus::Pending),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeePayment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub amount: f64,
    pub method: String,
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub paid_at: DateTime<Utc>,
}
