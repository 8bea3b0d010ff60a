use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Progress of the background parse of an uploaded resume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "resume_parse_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResumeParseStatus {
    Pending,
    Parsed,
    Failed,
}

impl std::fmt::Display for ResumeParseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResumeParseStatus::Pending => write!(f, "pending"),
            ResumeParseStatus::Parsed => write!(f, "parsed"),
            ResumeParseStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Database model for resumes
#[derive(Debug, Clone, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    pub parse_status: ResumeParseStatus,
    pub parse_error: Option<String>,
    pub parsed_data: Option<Json<serde_json::Value>>,
    pub raw_text: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Json<Vec<String>>,
    pub experience: Json<serde_json::Value>,
    pub education: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a freshly uploaded resume
#[derive(Debug)]
pub struct NewResume {
    pub user_id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
}
