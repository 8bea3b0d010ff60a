use sqlx::PgPool;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::applications::services::ApplicationService;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::candidate::dtos::{CandidateDashboardDto, CandidateStatsDto, ProfileChecks};
use crate::features::interviews::dtos::InterviewDto;
use crate::features::interviews::services::InterviewService;
use crate::features::jobs::dtos::JobDto;
use crate::features::jobs::models::Job;
use crate::features::jobs::services::job_service::JOB_COLUMNS;
use crate::features::users::services::UserService;

/// Window for upcoming candidate interviews
pub const UPCOMING_INTERVIEW_DAYS: i64 = 30;

const RECOMMENDED_JOBS: i64 = 5;

/// Candidate home screen
pub struct CandidateService {
    pool: PgPool,
    users: Arc<UserService>,
    applications: Arc<ApplicationService>,
    interviews: Arc<InterviewService>,
}

impl CandidateService {
    pub fn new(
        pool: PgPool,
        users: Arc<UserService>,
        applications: Arc<ApplicationService>,
        interviews: Arc<InterviewService>,
    ) -> Self {
        Self {
            pool,
            users,
            applications,
            interviews,
        }
    }

    pub async fn dashboard(&self, user: &AuthenticatedUser) -> Result<CandidateDashboardDto> {
        let account = self.users.get(user.id).await?;
        let application_stats = self.applications.stats_for_candidate(user.id).await?;
        let upcoming = self.upcoming_interviews(user).await?;

        let (resume_count, parsed_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE parse_status = 'parsed')
            FROM resumes
            WHERE user_id = $1
            "#,
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count resumes for {}: {:?}", user.id, e);
            AppError::Database(e)
        })?;

        let recommended_jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {}
            FROM jobs
            WHERE is_active AND deleted_at IS NULL
              AND NOT EXISTS (
                  SELECT 1
                  FROM applications a
                  JOIN resumes r ON r.id = a.resume_id
                  WHERE a.job_id = jobs.id AND r.user_id = $1
              )
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            JOB_COLUMNS
        ))
        .bind(user.id)
        .bind(RECOMMENDED_JOBS)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch recommended jobs: {:?}", e);
            AppError::Database(e)
        })?;

        let checks = ProfileChecks {
            has_name: !account.name.trim().is_empty(),
            has_email: !account.email.trim().is_empty(),
            has_role: account.role.is_some(),
            has_avatar_or_github: account.avatar_url.is_some() || account.github_id.is_some(),
            has_resume: resume_count > 0,
            has_parsed_resume: parsed_count > 0,
        };

        Ok(CandidateDashboardDto {
            stats: CandidateStatsDto {
                total_applications: application_stats.total,
                status_counts: application_stats.status_counts,
                average_match_score: application_stats.average_match_score,
                resume_count,
                upcoming_interviews: upcoming.len(),
            },
            recent_applications: application_stats.recent,
            recommended_jobs: recommended_jobs.into_iter().map(JobDto::from).collect(),
            profile_completion: checks.completion(),
        })
    }

    pub async fn upcoming_interviews(&self, user: &AuthenticatedUser) -> Result<Vec<InterviewDto>> {
        self.interviews
            .upcoming(user, UPCOMING_INTERVIEW_DAYS)
            .await
    }
}
