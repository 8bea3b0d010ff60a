use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "interview_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    Phone,
    Video,
    Onsite,
    Technical,
    Behavioral,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "interview_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

impl std::fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterviewStatus::Scheduled => write!(f, "scheduled"),
            InterviewStatus::Completed => write!(f, "completed"),
            InterviewStatus::Cancelled => write!(f, "cancelled"),
            InterviewStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "interview_recommendation", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterviewRecommendation {
    Hire,
    Reject,
    NextRound,
}

/// Database model for interviews
#[derive(Debug, Clone, FromRow)]
pub struct Interview {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&InterviewRecommendation::NextRound).unwrap(),
            "\"next_round\""
        );
        assert_eq!(
            serde_json::from_str::<InterviewType>("\"onsite\"").unwrap(),
            InterviewType::Onsite
        );
        assert_eq!(InterviewStatus::Cancelled.to_string(), "cancelled");
    }
}
