use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::applications::models::{Application, ApplicationStatus, MatchAnalysis};
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::PaginationQuery;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ApplyJobDto {
    pub resume_id: Uuid,

    #[validate(length(max = 5000, message = "Cover letter must be at most 5000 characters"))]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateApplicationStatusDto {
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationDto {
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

impl From<Application> for ApplicationDto {
    fn from(a: Application) -> Self {
        Self {
            id: a.id,
            resume_id: a.resume_id,
            job_id: a.job_id,
            status: a.status,
            cover_letter: a.cover_letter,
            match_score: a.match_score,
            hr_feedback: a.hr_feedback,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// Application with the job and candidate it links
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApplicationDetailDto {
    pub id: Uuid,
    pub job_id: Uuid,
    pub resume_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub match_score: Option<f64>,
    pub hr_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub employment_type: String,
    pub resume_filename: String,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplyResponseDto {
    pub application: ApplicationDto,
    pub job_title: String,
    pub company: String,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ApplicationListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit", alias = "page_size", alias = "per_page")]
    pub limit: i64,
    pub status: Option<ApplicationStatus>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl ApplicationListQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page, self.limit)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplicationStatsDto {
    pub total: i64,
    pub status_counts: BTreeMap<String, i64>,
    pub average_match_score: f64,
    pub recent: Vec<ApplicationDetailDto>,
}

/// Every status keyed by name, zero when absent from `rows`
pub fn status_counts(rows: &[(ApplicationStatus, i64)]) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<String, i64> = ApplicationStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for (status, count) in rows {
        counts.insert(status.as_str().to_string(), *count);
    }
    counts
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KeywordMatchDto {
    pub score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchAnalysisDto {
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub resume_id: Uuid,
    pub keyword: KeywordMatchDto,
    /// Present when a chat model is configured
    pub ai_analysis: Option<MatchAnalysis>,
}

fn default_min_score() -> f64 {
    0.5
}

fn default_max_results() -> usize {
    20
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct JobMatchRequestDto {
    #[serde(default = "default_min_score")]
    #[validate(range(min = 0.0, max = 1.0, message = "min_score must be between 0 and 1"))]
    pub min_score: f64,

    #[serde(default = "default_max_results")]
    #[validate(range(min = 1, max = 100, message = "max_results must be between 1 and 100"))]
    pub max_results: usize,

    /// Score these resumes instead of the job's applicants
    pub resume_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResumeMatchDto {
    pub resume_id: Uuid,
    pub application_id: Option<Uuid>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub filename: String,
    pub score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobMatchResultsDto {
    pub job_id: Uuid,
    pub total_scored: usize,
    pub matches: Vec<ResumeMatchDto>,
}

/// Keyword match of one of your resumes against a job, before applying
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResumeJobMatchDto {
    pub job_id: Uuid,
    pub resume_id: Uuid,
    pub job_title: String,
    pub company: String,
    /// False when the job is closed for applications
    pub accepts_applications: bool,
    pub keyword: KeywordMatchDto,
}

/// What the resume behind an application still lacks for the job
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SkillGapDto {
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub company: String,
    pub required_count: usize,
    /// Share of requirements not covered, 0..=1
    pub gap_ratio: f64,
    pub keyword: KeywordMatchDto,
}

/// One job on a resume's best-match list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobMatchSummaryDto {
    pub job_id: Uuid,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub employment_type: String,
    pub score: f64,
    pub top_matching_skills: Vec<String>,
    pub critical_missing_skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResumeBestMatchesDto {
    pub resume_id: Uuid,
    pub resume_filename: String,
    pub matches: Vec<JobMatchSummaryDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BestMatchesDto {
    pub matches_by_resume: Vec<ResumeBestMatchesDto>,
    /// Matches above the threshold before per-resume truncation
    pub total_matches: usize,
    pub resumes_analyzed: usize,
    pub jobs_analyzed: usize,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CompareCandidatesDto {
    #[validate(length(min = 2, max = 100, message = "Between 2 and 100 resumes can be compared"))]
    pub resume_ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_fill_missing() {
        let counts = status_counts(&[(ApplicationStatus::Pending, 3), (ApplicationStatus::Hired, 1)]);
        assert_eq!(counts.len(), ApplicationStatus::ALL.len());
        assert_eq!(counts["pending"], 3);
        assert_eq!(counts["hired"], 1);
        assert_eq!(counts["withdrawn"], 0);
    }

    #[test]
    fn test_match_request_defaults() {
        let dto: JobMatchRequestDto = serde_json::from_str("{}").unwrap();
        assert_eq!(dto.min_score, 0.5);
        assert_eq!(dto.max_results, 20);
        assert!(dto.resume_ids.is_none());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_match_request_bounds() {
        let dto: JobMatchRequestDto =
            serde_json::from_str(r#"{"min_score": 1.5, "max_results": 0}"#).unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("min_score"));
        assert!(errors.field_errors().contains_key("max_results"));
    }

    #[test]
    fn test_compare_needs_two_resumes() {
        let one = CompareCandidatesDto {
            resume_ids: vec![Uuid::now_v7()],
        };
        assert!(one.validate().is_err());

        let two = CompareCandidatesDto {
            resume_ids: vec![Uuid::now_v7(), Uuid::now_v7()],
        };
        assert!(two.validate().is_ok());
    }

    #[test]
    fn test_status_update_accepts_alias() {
        let dto: UpdateApplicationStatusDto =
            serde_json::from_str(r#"{"status": "reviewing"}"#).unwrap();
        assert_eq!(dto.status, ApplicationStatus::Reviewed);
    }
}
