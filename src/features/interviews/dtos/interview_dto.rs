use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::interviews::models::{
    InterviewRecommendation, InterviewStatus, InterviewType,
};
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::PaginationQuery;

fn default_interview_type() -> InterviewType {
    InterviewType::Technical
}

fn default_duration() -> i32 {
    60
}

/// Interviews can only be booked ahead of time
pub fn check_future(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if scheduled_at <= now {
        return Err(AppError::Validation(
            "scheduled_at must be in the future".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateInterviewDto {
    pub application_id: Uuid,

    #[serde(default = "default_interview_type")]
    pub interview_type: InterviewType,

    #[validate(length(min = 1, max = 255, message = "Title is required (max 255 characters)"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub scheduled_at: DateTime<Utc>,

    #[serde(default = "default_duration")]
    #[validate(range(min = 15, max = 480, message = "Duration must be 15-480 minutes"))]
    pub duration_minutes: i32,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[validate(url(message = "Meeting link must be a valid URL"))]
    pub meeting_link: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateInterviewDto {
    pub interview_type: Option<InterviewType>,

    #[validate(length(min = 1, max = 255, message = "Title cannot be empty (max 255 characters)"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub scheduled_at: Option<DateTime<Utc>>,

    #[validate(range(min = 15, max = 480, message = "Duration must be 15-480 minutes"))]
    pub duration_minutes: Option<i32>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[validate(url(message = "Meeting link must be a valid URL"))]
    pub meeting_link: Option<String>,

    pub status: Option<InterviewStatus>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct InterviewFeedbackDto {
    #[validate(length(min = 1, max = 5000, message = "Feedback must be 1-5000 characters"))]
    pub feedback: String,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    pub recommendation: InterviewRecommendation,
}

/// Interview with the application, job and candidate it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InterviewDto {
    pub id: Uuid,
    pub application_id: Uuid,
    pub interviewer_id: Uuid,
    pub interview_type: InterviewType,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub status: InterviewStatus,
    pub feedback: Option<String>,
    pub rating: Option<i32>,
    pub recommendation: Option<InterviewRecommendation>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub job_id: Uuid,
    pub job_title: String,
    pub company: String,
    pub hr_id: Uuid,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct InterviewListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit", alias = "page_size", alias = "per_page")]
    pub limit: i64,
    pub status: Option<InterviewStatus>,
    /// Scheduled at or after
    pub date_from: Option<DateTime<Utc>>,
    /// Scheduled at or before
    pub date_to: Option<DateTime<Utc>>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl InterviewListQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page, self.limit)
    }
}
