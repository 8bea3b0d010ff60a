use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for job postings
#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: Json<Vec<String>>,
    pub location: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub employment_type: String,
    pub category: String,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Open for new applications
    pub fn accepts_applications(&self) -> bool {
        self.is_active && !self.is_deleted()
    }
}

/// Validated data for inserting a job
#[derive(Debug)]
pub struct NewJob {
    pub created_by: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub location: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub employment_type: String,
    pub category: String,
    pub is_active: bool,
}
