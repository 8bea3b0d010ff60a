use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};

/// Application status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    #[serde(alias = "reviewing")]
    Reviewed,
    Shortlisted,
    #[serde(alias = "interviewed")]
    Interview,
    Offered,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interview,
        ApplicationStatus::Offered,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Withdrawn applications can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Withdrawn)
    }

    /// Statuses that scheduling an interview moves forward
    pub fn advances_on_interview(&self) -> bool {
        matches!(self, ApplicationStatus::Pending | ApplicationStatus::Reviewed)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" | "reviewing" => Ok(ApplicationStatus::Reviewed),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "interview" | "interviewed" => Ok(ApplicationStatus::Interview),
            "offered" => Ok(ApplicationStatus::Offered),
            "hired" => Ok(ApplicationStatus::Hired),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            other => Err(format!("Invalid application status '{}'", other)),
        }
    }
}

/// Checks a status change made by the HR owner of the job.
///
/// HR may move an application to any status except `withdrawn`, from any
/// status except `withdrawn`.
pub fn check_hr_transition(from: ApplicationStatus, to: ApplicationStatus) -> Result<()> {
    if to == ApplicationStatus::Withdrawn {
        return Err(AppError::BadRequest(
            "Only the candidate can withdraw an application".to_string(),
        ));
    }
    if from.is_terminal() {
        return Err(AppError::Conflict(
            "Application has been withdrawn and can no longer change".to_string(),
        ));
    }
    Ok(())
}

/// Checks a withdrawal made by the candidate
pub fn check_withdrawal(from: ApplicationStatus) -> Result<()> {
    if from.is_terminal() {
        return Err(AppError::Conflict(
            "Application has already been withdrawn".to_string(),
        ));
    }
    Ok(())
}

/// Database model for applications
#[derive(Debug, Clone, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub match_score: Option<f64>,
    pub hr_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application joined with the people it concerns, used for access checks
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationAccess {
    pub id: Uuid,
    pub job_id: Uuid,
    pub resume_id: Uuid,
    pub status: ApplicationStatus,
    pub candidate_id: Uuid,
    pub hr_id: Uuid,
}

/// Application removed as a side effect of deleting its resume or account,
/// with the HR user who owned the job
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RemovedApplication {
    pub application_id: Uuid,
    pub hr_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_aliases() {
        assert_eq!(
            "reviewing".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Reviewed
        );
        assert_eq!(
            serde_json::from_str::<ApplicationStatus>("\"interviewed\"").unwrap(),
            ApplicationStatus::Interview
        );
        assert_eq!(
            serde_json::to_string(&ApplicationStatus::Reviewed).unwrap(),
            "\"reviewed\""
        );
        assert!("archived".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_hr_can_set_any_status_but_withdrawn() {
        for from in ApplicationStatus::ALL {
            for to in ApplicationStatus::ALL {
                let result = check_hr_transition(from, to);
                let allowed = !from.is_terminal() && to != ApplicationStatus::Withdrawn;
                assert_eq!(result.is_ok(), allowed, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_withdrawal_is_terminal() {
        assert!(check_withdrawal(ApplicationStatus::Interview).is_ok());
        let err = check_withdrawal(ApplicationStatus::Withdrawn).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_interview_advances_only_early_statuses() {
        assert!(ApplicationStatus::Pending.advances_on_interview());
        assert!(ApplicationStatus::Reviewed.advances_on_interview());
        assert!(!ApplicationStatus::Shortlisted.advances_on_interview());
        assert!(!ApplicationStatus::Withdrawn.advances_on_interview());
    }
}
