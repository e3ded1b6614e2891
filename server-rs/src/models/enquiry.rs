use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enquiry_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    Open,
    InProgress,
    Closed,
}

impl EnquiryStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Some(EnquiryStatus::Open),
            "in_progress" => Some(EnquiryStatus::InProgress),
            "closed" => Some(EnquiryStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    pub id: i32,
    pub content: String,
    pub customer_id: i32,
    pub status: EnquiryStatus,
    pub admin_response: Option<String>,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitEnquiryRequest {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryVisibilityRequest {
    pub is_hidden: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EnquiryStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnquiryResponseRequest {
    pub response: Option<String>,
}
