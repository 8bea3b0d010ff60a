use minijinja::context;
use sqlx::types::Json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::matcher::{best_matches, keyword_match, rank_matches, resume_match, BEST_MATCH_JOB_LIMIT};
use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::applications::dtos::{
    status_counts, ApplicationDetailDto, ApplicationListQuery, ApplicationStatsDto,
    ApplyJobDto, ApplyResponseDto, BestMatchesDto, CompareCandidatesDto, JobMatchRequestDto,
    JobMatchResultsDto, MatchAnalysisDto, ResumeJobMatchDto, SkillGapDto,
};
use crate::features::applications::models::{
    check_hr_transition, check_withdrawal, Application, ApplicationAccess, ApplicationStatus,
    MatchAnalysis,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::jobs::services::JobService;
use crate::features::realtime::events::{ApplicationEvent, ApplicationStatusEvent};
use crate::features::realtime::{Audience, EventHub, RealtimeEvent};
use crate::features::resumes::services::ResumeService;
use crate::modules::ai::ChatModel;
use crate::shared::llm::{parse_with_fallback, LlmResponse};
use crate::shared::prompts::{render_template, MATCH_ANALYSIS};
use crate::shared::types::Paginated;

pub(crate) const APPLICATION_COLUMNS: &str = "id, resume_id, job_id, status, cover_letter, \
     match_score, hr_feedback, created_at, updated_at";

/// Applications joined with job, resume and candidate. Alias `a`, `j`, `r`, `u`.
pub(crate) const APPLICATION_DETAIL_SELECT: &str = r#"
    SELECT a.id, a.job_id, a.resume_id, a.status, a.cover_letter, a.match_score,
           a.hr_feedback, a.created_at, a.updated_at,
           j.title AS job_title, j.company, j.location, j.employment_type,
           r.filename AS resume_filename,
           u.id AS candidate_id, u.name AS candidate_name, u.email AS candidate_email
    FROM applications a
    JOIN jobs j ON j.id = a.job_id
    JOIN resumes r ON r.id = a.resume_id
    JOIN users u ON u.id = r.user_id
"#;

const RECENT_LIMIT: i64 = 5;

#[derive(sqlx::FromRow)]
struct CandidateResumeRow {
    resume_id: Uuid,
    application_id: Option<Uuid>,
    filename: String,
    skills: Json<Vec<String>>,
    candidate_name: String,
    candidate_email: String,
}

/// Service for job applications and their keyword match
pub struct ApplicationService {
    pool: PgPool,
    jobs: Arc<JobService>,
    resumes: Arc<ResumeService>,
    hub: Arc<EventHub>,
    analysis_model: Option<Arc<dyn ChatModel>>,
}

impl ApplicationService {
    pub fn new(
        pool: PgPool,
        jobs: Arc<JobService>,
        resumes: Arc<ResumeService>,
        hub: Arc<EventHub>,
        analysis_model: Option<Arc<dyn ChatModel>>,
    ) -> Self {
        Self {
            pool,
            jobs,
            resumes,
            hub,
            analysis_model,
        }
    }

    /// Both sides of an application
    fn participants(access: &ApplicationAccess) -> Audience {
        Audience::Users(vec![access.candidate_id, access.hr_id])
    }

    pub async fn apply(
        &self,
        user: &AuthenticatedUser,
        job_id: Uuid,
        dto: ApplyJobDto,
    ) -> Result<ApplyResponseDto> {
        let job = self.jobs.get(job_id).await?;
        if !job.accepts_applications() {
            return Err(AppError::BadRequest(
                "This job is not accepting applications".to_string(),
            ));
        }

        let resume = self.resumes.get_owned(user.id, dto.resume_id).await?;
        let matched = keyword_match(&job.requirements.0, &resume.skills.0);

        let cover_letter = dto
            .cover_letter
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let application = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (id, resume_id, job_id, cover_letter, match_score)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(resume.id)
        .bind(job.id)
        .bind(cover_letter)
        .bind(matched.score)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::Conflict(
                    "You have already applied to this job with this resume".to_string(),
                );
            }
            tracing::error!("Failed to create application: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Application {} for job {} (score {:.2})",
            application.id,
            job.id,
            matched.score
        );
        self.hub.publish(
            Audience::Users(vec![user.id, job.created_by]),
            RealtimeEvent::NewApplication(ApplicationEvent {
                application_id: application.id,
                job_id: job.id,
            }),
        );

        Ok(ApplyResponseDto {
            application: application.into(),
            job_title: job.title,
            company: job.company,
            matched_skills: matched.matched_skills,
            missing_skills: matched.missing_skills,
        })
    }

    pub async fn access(&self, id: Uuid) -> Result<ApplicationAccess> {
        sqlx::query_as::<_, ApplicationAccess>(
            r#"
            SELECT a.id, a.job_id, a.resume_id, a.status,
                   r.user_id AS candidate_id, j.created_by AS hr_id
            FROM applications a
            JOIN resumes r ON r.id = a.resume_id
            JOIN jobs j ON j.id = a.job_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch application {}: {:?}", id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))
    }

    /// Access for the candidate who applied or the HR who owns the job
    pub async fn access_as_participant(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<ApplicationAccess> {
        let access = self.access(id).await?;
        if access.candidate_id != user.id && access.hr_id != user.id {
            return Err(AppError::Forbidden(
                "You do not have access to this application".to_string(),
            ));
        }
        Ok(access)
    }

    /// Access for the HR who owns the job
    pub async fn access_as_owner(&self, user_id: Uuid, id: Uuid) -> Result<ApplicationAccess> {
        let access = self.access(id).await?;
        if access.hr_id != user_id {
            return Err(AppError::Forbidden(
                "You can only manage applications to your own jobs".to_string(),
            ));
        }
        Ok(access)
    }

    pub async fn detail(&self, id: Uuid) -> Result<ApplicationDetailDto> {
        sqlx::query_as::<_, ApplicationDetailDto>(&format!(
            "{} WHERE a.id = $1",
            APPLICATION_DETAIL_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch application detail {}: {:?}", id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ApplicationDetailDto> {
        self.access_as_participant(user, id).await?;
        self.detail(id).await
    }

    /// The candidate's own applications, newest first
    pub async fn list_for_candidate(
        &self,
        user_id: Uuid,
        query: &ApplicationListQuery,
    ) -> Result<Paginated<ApplicationDetailDto>> {
        let pagination = query.pagination();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM applications a
            JOIN resumes r ON r.id = a.resume_id
            WHERE r.user_id = $1 AND ($2::application_status IS NULL OR a.status = $2)
            "#,
        )
        .bind(user_id)
        .bind(query.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count applications for {}: {:?}", user_id, e);
            AppError::Database(e)
        })?;

        let items = sqlx::query_as::<_, ApplicationDetailDto>(&format!(
            r#"
            {}
            WHERE r.user_id = $1 AND ($2::application_status IS NULL OR a.status = $2)
            ORDER BY a.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            APPLICATION_DETAIL_SELECT
        ))
        .bind(user_id)
        .bind(query.status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list applications for {}: {:?}", user_id, e);
            AppError::Database(e)
        })?;

        Ok(Paginated::new(items, total, &pagination))
    }

    pub async fn stats_for_candidate(&self, user_id: Uuid) -> Result<ApplicationStatsDto> {
        let rows = sqlx::query_as::<_, (ApplicationStatus, i64)>(
            r#"
            SELECT a.status, COUNT(*)
            FROM applications a
            JOIN resumes r ON r.id = a.resume_id
            WHERE r.user_id = $1
            GROUP BY a.status
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count application statuses: {:?}", e);
            AppError::Database(e)
        })?;

        let average: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT AVG(a.match_score)
            FROM applications a
            JOIN resumes r ON r.id = a.resume_id
            WHERE r.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to average match scores: {:?}", e);
            AppError::Database(e)
        })?;

        let recent = self.recent_for_candidate(user_id, RECENT_LIMIT).await?;

        Ok(ApplicationStatsDto {
            total: rows.iter().map(|(_, count)| count).sum(),
            status_counts: status_counts(&rows),
            average_match_score: average.unwrap_or(0.0),
            recent,
        })
    }

    pub async fn recent_for_candidate(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ApplicationDetailDto>> {
        sqlx::query_as::<_, ApplicationDetailDto>(&format!(
            "{} WHERE r.user_id = $1 ORDER BY a.created_at DESC LIMIT $2",
            APPLICATION_DETAIL_SELECT
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch recent applications: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Compare-and-set on the status column.
    ///
    /// Only writes when the row still holds `from`, so a concurrent change
    /// between the access check and this write is never overwritten. Returns
    /// `None` when the row moved on.
    async fn transition(
        &self,
        id: Uuid,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<Option<Application>> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2 AND status <> 'withdrawn'
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::Conflict(
                    "Another open application exists for this resume and job".to_string(),
                );
            }
            tracing::error!("Failed to update status of application {}: {:?}", id, e);
            AppError::Database(e)
        })
    }

    /// Error for a lost compare-and-set, re-checked against the current row
    async fn lost_transition(
        &self,
        id: Uuid,
        check: impl Fn(ApplicationStatus) -> Result<()>,
    ) -> AppError {
        match self.access(id).await {
            Ok(current) => match check(current.status) {
                Err(e) => e,
                Ok(()) => AppError::Conflict(
                    "Application was changed by another request, reload and try again"
                        .to_string(),
                ),
            },
            Err(e) => e,
        }
    }

    pub async fn withdraw(&self, user_id: Uuid, id: Uuid) -> Result<Application> {
        let access = self.access(id).await?;
        if access.candidate_id != user_id {
            return Err(AppError::Forbidden(
                "You can only withdraw your own applications".to_string(),
            ));
        }
        check_withdrawal(access.status)?;

        let application = match self
            .transition(id, access.status, ApplicationStatus::Withdrawn)
            .await?
        {
            Some(application) => application,
            None => return Err(self.lost_transition(id, check_withdrawal).await),
        };

        tracing::info!("Application {} withdrawn", id);
        self.hub.publish(
            Self::participants(&access),
            RealtimeEvent::ApplicationWithdrawn(ApplicationEvent {
                application_id: id,
                job_id: access.job_id,
            }),
        );

        Ok(application)
    }

    /// Status change by the HR owner of the job
    pub async fn update_status(
        &self,
        user_id: Uuid,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let access = self.access_as_owner(user_id, id).await?;
        check_hr_transition(access.status, status)?;

        let application = match self.transition(id, access.status, status).await? {
            Some(application) => application,
            None => {
                return Err(self
                    .lost_transition(id, |from| check_hr_transition(from, status))
                    .await)
            }
        };

        tracing::info!("Application {} moved {} -> {}", id, access.status, status);
        self.hub.publish(
            Self::participants(&access),
            RealtimeEvent::ApplicationStatusChanged(ApplicationStatusEvent {
                application_id: id,
                job_id: access.job_id,
                old_status: access.status,
                new_status: status,
            }),
        );

        Ok(application)
    }

    /// Moves an application forward after an interview was scheduled.
    ///
    /// Returns the previous status when it changed. A row that changed since
    /// `access` was read, including a withdrawal, is left alone.
    pub async fn advance_for_interview(
        &self,
        access: &ApplicationAccess,
    ) -> Result<Option<ApplicationStatus>> {
        if !access.status.advances_on_interview() {
            return Ok(None);
        }

        let moved = self
            .transition(access.id, access.status, ApplicationStatus::Interview)
            .await?;
        if moved.is_none() {
            tracing::debug!(
                "Application {} changed before it could move to interview",
                access.id
            );
            return Ok(None);
        }

        self.hub.publish(
            Self::participants(access),
            RealtimeEvent::ApplicationStatusChanged(ApplicationStatusEvent {
                application_id: access.id,
                job_id: access.job_id,
                old_status: access.status,
                new_status: ApplicationStatus::Interview,
            }),
        );

        Ok(Some(access.status))
    }

    /// Stores HR feedback on the application
    pub async fn set_feedback(
        &self,
        user_id: Uuid,
        id: Uuid,
        feedback: &str,
    ) -> Result<Application> {
        let access = self.access_as_owner(user_id, id).await?;

        let application = sqlx::query_as::<_, Application>(&format!(
            "UPDATE applications SET hr_feedback = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .bind(feedback.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store feedback for application {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        self.hub.publish(
            Self::participants(&access),
            RealtimeEvent::ApplicationFeedbackAdded(ApplicationEvent {
                application_id: id,
                job_id: access.job_id,
            }),
        );

        Ok(application)
    }

    /// Keyword breakdown, plus the model's opinion when one is configured
    pub async fn match_analysis(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<MatchAnalysisDto> {
        let access = self.access_as_participant(user, id).await?;

        let job = self.jobs.find_by_id(access.job_id).await?.ok_or_else(|| {
            AppError::NotFound("Job not found".to_string())
        })?;
        let resume = self.resumes.find_by_id(access.resume_id).await?.ok_or_else(|| {
            AppError::NotFound("Resume not found".to_string())
        })?;

        let matched = keyword_match(&job.requirements.0, &resume.skills.0);

        let ai_analysis = match &self.analysis_model {
            Some(model) => {
                let prompt = render_template(
                    MATCH_ANALYSIS,
                    context! {
                        job_title => job.title,
                        company => job.company,
                        requirements => job.requirements.0,
                        job_description => job.description,
                        skills => resume.skills.0,
                        experience => resume.experience.0,
                        keyword_score => (matched.score * 100.0).round() as i64,
                        json_schema => MatchAnalysis::json_schema_string(),
                    },
                )
                .map_err(|e| AppError::Internal(e.to_string()))?;

                let analysis = match model.complete_json(&prompt).await {
                    Ok(reply) => parse_with_fallback(&reply),
                    Err(e) => {
                        tracing::warn!("Match analysis for application {} failed: {}", id, e);
                        MatchAnalysis::fallback(e.to_string())
                    }
                };
                Some(analysis)
            }
            None => None,
        };

        Ok(MatchAnalysisDto {
            application_id: access.id,
            job_id: access.job_id,
            resume_id: access.resume_id,
            keyword: matched.into(),
            ai_analysis,
        })
    }

    /// Scores one of the caller's resumes against a live job without applying
    pub async fn match_with_resume(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        resume_id: Uuid,
    ) -> Result<ResumeJobMatchDto> {
        let job = self.jobs.get(job_id).await?;
        let resume = self.resumes.get_owned(user_id, resume_id).await?;
        let matched = keyword_match(&job.requirements.0, &resume.skills.0);

        Ok(ResumeJobMatchDto {
            job_id: job.id,
            resume_id: resume.id,
            accepts_applications: job.accepts_applications(),
            job_title: job.title,
            company: job.company,
            keyword: matched.into(),
        })
    }

    /// Best open jobs for each of the caller's resumes
    pub async fn best_matches_for_user(&self, user_id: Uuid) -> Result<BestMatchesDto> {
        let resumes = self.resumes.list_for_user(user_id).await?;
        if resumes.is_empty() {
            return Ok(best_matches(&[], &[]));
        }

        let jobs = self.jobs.list_open(BEST_MATCH_JOB_LIMIT).await?;
        let result = best_matches(&resumes, &jobs);
        tracing::debug!(
            "Best matches for {}: {} pair(s) over {} resume(s) and {} job(s)",
            user_id,
            result.total_matches,
            result.resumes_analyzed,
            result.jobs_analyzed
        );
        Ok(result)
    }

    /// Requirements the application's resume covers and misses
    pub async fn skill_gap(&self, user: &AuthenticatedUser, id: Uuid) -> Result<SkillGapDto> {
        let access = self.access_as_participant(user, id).await?;

        let job = self.jobs.find_by_id(access.job_id).await?.ok_or_else(|| {
            AppError::NotFound("Job not found".to_string())
        })?;
        let resume = self.resumes.find_by_id(access.resume_id).await?.ok_or_else(|| {
            AppError::NotFound("Resume not found".to_string())
        })?;

        let matched = keyword_match(&job.requirements.0, &resume.skills.0);
        let required_count = matched.matched_skills.len() + matched.missing_skills.len();
        let gap_ratio = if required_count == 0 {
            0.0
        } else {
            matched.missing_skills.len() as f64 / required_count as f64
        };

        Ok(SkillGapDto {
            application_id: access.id,
            job_id: job.id,
            job_title: job.title,
            company: job.company,
            required_count,
            gap_ratio,
            keyword: matched.into(),
        })
    }

    /// Side-by-side scores for chosen resumes on one of the caller's jobs.
    ///
    /// Every id must belong to a resume that applied to one of the caller's
    /// jobs, otherwise nothing is compared.
    pub async fn compare_candidates(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        dto: &CompareCandidatesDto,
    ) -> Result<JobMatchResultsDto> {
        let mut ids = dto.resume_ids.clone();
        ids.sort();
        ids.dedup();
        if ids.len() < 2 {
            return Err(AppError::Validation(
                "At least 2 different resumes are required for comparison".to_string(),
            ));
        }

        let request = JobMatchRequestDto {
            min_score: 0.0,
            max_results: ids.len(),
            resume_ids: Some(ids),
        };
        let results = self.rank_for_job(user_id, job_id, &request).await?;

        if results.total_scored != request.max_results {
            return Err(AppError::NotFound("Some resumes were not found".to_string()));
        }
        Ok(results)
    }

    /// Ranks resumes against one of the caller's jobs.
    ///
    /// Without `resume_ids` the job's open applicants are scored. Explicit ids
    /// are limited to resumes that applied to any of the caller's jobs.
    pub async fn rank_for_job(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        dto: &JobMatchRequestDto,
    ) -> Result<JobMatchResultsDto> {
        let job = self.jobs.get_owned(user_id, job_id).await?;

        let rows = match &dto.resume_ids {
            Some(ids) => {
                sqlx::query_as::<_, CandidateResumeRow>(
                    r#"
                    SELECT r.id AS resume_id,
                           (SELECT a.id FROM applications a
                            WHERE a.resume_id = r.id AND a.job_id = $3
                              AND a.status <> 'withdrawn'
                            LIMIT 1) AS application_id,
                           r.filename, r.skills,
                           u.name AS candidate_name, u.email AS candidate_email
                    FROM resumes r
                    JOIN users u ON u.id = r.user_id
                    WHERE r.id = ANY($1)
                      AND EXISTS (
                          SELECT 1 FROM applications a
                          JOIN jobs j ON j.id = a.job_id
                          WHERE a.resume_id = r.id AND j.created_by = $2
                      )
                    "#,
                )
                .bind(ids.as_slice())
                .bind(user_id)
                .bind(job.id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, CandidateResumeRow>(
                    r#"
                    SELECT r.id AS resume_id, a.id AS application_id,
                           r.filename, r.skills,
                           u.name AS candidate_name, u.email AS candidate_email
                    FROM applications a
                    JOIN resumes r ON r.id = a.resume_id
                    JOIN users u ON u.id = r.user_id
                    WHERE a.job_id = $1 AND a.status <> 'withdrawn'
                    "#,
                )
                .bind(job.id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| {
            tracing::error!("Failed to load resumes for job {}: {:?}", job_id, e);
            AppError::Database(e)
        })?;

        let total_scored = rows.len();
        let scored = rows
            .into_iter()
            .map(|row| {
                let matched = keyword_match(&job.requirements.0, &row.skills.0);
                resume_match(
                    row.resume_id,
                    row.application_id,
                    row.candidate_name,
                    row.candidate_email,
                    row.filename,
                    matched,
                )
            })
            .collect();

        Ok(JobMatchResultsDto {
            job_id: job.id,
            total_scored,
            matches: rank_matches(scored, dto.min_score, dto.max_results),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::models::UserRole;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{
        seed_application, seed_job, seed_resume, seed_user, test_hub,
    };
    use tokio_test::{assert_err, assert_ok};

    fn service(pool: &PgPool) -> ApplicationService {
        let hub = test_hub();
        let storage = Arc::new(LocalStorage::with_root(std::env::temp_dir()));
        ApplicationService::new(
            pool.clone(),
            Arc::new(JobService::new(pool.clone(), Arc::clone(&hub))),
            Arc::new(ResumeService::new(pool.clone(), storage, Arc::clone(&hub), None)),
            hub,
            None,
        )
    }

    fn apply_with(resume_id: Uuid) -> ApplyJobDto {
        ApplyJobDto {
            resume_id,
            cover_letter: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_apply_is_conflict(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust", "SQL"]).await;
        let resume_id = seed_resume(&pool, candidate.id, &["rust"]).await;

        let first = assert_ok!(service.apply(&candidate, job_id, apply_with(resume_id)).await);
        assert_eq!(first.matched_skills, vec!["Rust".to_string()]);

        let err = assert_err!(service.apply(&candidate, job_id, apply_with(resume_id)).await);
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_reapply_after_withdrawal_is_allowed(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust"]).await;
        let resume_id = seed_resume(&pool, candidate.id, &["rust"]).await;

        let first = service.apply(&candidate, job_id, apply_with(resume_id)).await.unwrap();
        service.withdraw(candidate.id, first.application.id).await.unwrap();

        assert_ok!(service.apply(&candidate, job_id, apply_with(resume_id)).await);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_second_withdrawal_is_conflict(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust"]).await;
        let resume_id = seed_resume(&pool, candidate.id, &["rust"]).await;
        let id = seed_application(&pool, resume_id, job_id).await;

        let withdrawn = assert_ok!(service.withdraw(candidate.id, id).await);
        assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);

        let err = assert_err!(service.withdraw(candidate.id, id).await);
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_concurrent_withdrawals_have_one_winner(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust"]).await;
        let resume_id = seed_resume(&pool, candidate.id, &["rust"]).await;
        let id = seed_application(&pool, resume_id, job_id).await;

        let (a, b) = tokio::join!(
            service.withdraw(candidate.id, id),
            service.withdraw(candidate.id, id)
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let loser = a.err().or(b.err()).unwrap();
        assert!(matches!(loser, AppError::Conflict(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_status_update_after_withdrawal_is_conflict(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust"]).await;
        let resume_id = seed_resume(&pool, candidate.id, &["rust"]).await;
        let id = seed_application(&pool, resume_id, job_id).await;

        service.withdraw(candidate.id, id).await.unwrap();

        let err = assert_err!(
            service
                .update_status(hr.id, id, ApplicationStatus::Shortlisted)
                .await
        );
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(
            service.access(id).await.unwrap().status,
            ApplicationStatus::Withdrawn
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_stale_transition_leaves_row_untouched(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust"]).await;
        let resume_id = seed_resume(&pool, candidate.id, &["rust"]).await;
        let id = seed_application(&pool, resume_id, job_id).await;

        let moved = service
            .transition(id, ApplicationStatus::Reviewed, ApplicationStatus::Hired)
            .await
            .unwrap();
        assert!(moved.is_none());
        assert_eq!(
            service.access(id).await.unwrap().status,
            ApplicationStatus::Pending
        );

        let err = service
            .lost_transition(id, |from| check_hr_transition(from, ApplicationStatus::Hired))
            .await;
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_match_with_resume_needs_own_resume(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let other = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust", "Kubernetes"]).await;
        let resume_id = seed_resume(&pool, candidate.id, &["rust"]).await;

        let preview = service
            .match_with_resume(candidate.id, job_id, resume_id)
            .await
            .unwrap();
        assert!(preview.accepts_applications);
        assert_eq!(preview.keyword.score, 0.5);
        assert_eq!(preview.keyword.missing_skills, vec!["Kubernetes".to_string()]);

        let err = service
            .match_with_resume(other.id, job_id, resume_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_best_matches_skip_closed_jobs(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let open_job = seed_job(&pool, hr.id, &["Rust"]).await;
        let closed_job = seed_job(&pool, hr.id, &["Rust"]).await;
        sqlx::query("UPDATE jobs SET is_active = FALSE WHERE id = $1")
            .bind(closed_job)
            .execute(&pool)
            .await
            .unwrap();
        seed_resume(&pool, candidate.id, &["rust"]).await;

        let result = service.best_matches_for_user(candidate.id).await.unwrap();
        assert_eq!(result.jobs_analyzed, 1);
        assert_eq!(result.total_matches, 1);
        assert_eq!(result.matches_by_resume[0].matches[0].job_id, open_job);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_best_matches_without_resumes(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        seed_job(&pool, hr.id, &["Rust"]).await;

        let result = service.best_matches_for_user(candidate.id).await.unwrap();
        assert_eq!(result.resumes_analyzed, 0);
        assert!(result.matches_by_resume.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_skill_gap_for_participants(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let stranger = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust", "SQL", "Go", "Docker"]).await;
        let resume_id = seed_resume(&pool, candidate.id, &["rust"]).await;
        let id = seed_application(&pool, resume_id, job_id).await;

        let gap = service.skill_gap(&candidate, id).await.unwrap();
        assert_eq!(gap.required_count, 4);
        assert_eq!(gap.gap_ratio, 0.75);
        assert_eq!(gap.keyword.matched_skills, vec!["Rust".to_string()]);

        assert!(service.skill_gap(&hr, id).await.is_ok());
        let err = service.skill_gap(&stranger, id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_compare_candidates_needs_known_applicants(pool: PgPool) {
        let service = service(&pool);
        let hr = seed_user(&pool, UserRole::Hr).await;
        let first = seed_user(&pool, UserRole::Candidate).await;
        let second = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust", "SQL"]).await;
        let strong = seed_resume(&pool, first.id, &["rust", "sql"]).await;
        let weak = seed_resume(&pool, second.id, &["cobol"]).await;
        seed_application(&pool, strong, job_id).await;
        seed_application(&pool, weak, job_id).await;

        let dto = CompareCandidatesDto {
            resume_ids: vec![weak, strong],
        };
        let results = service.compare_candidates(hr.id, job_id, &dto).await.unwrap();
        assert_eq!(results.total_scored, 2);
        assert_eq!(results.matches.len(), 2);
        assert_eq!(results.matches[0].resume_id, strong);
        assert_eq!(results.matches[1].score, 0.0);

        let outsider = seed_resume(&pool, second.id, &["rust"]).await;
        let dto = CompareCandidatesDto {
            resume_ids: vec![strong, outsider],
        };
        let err = service.compare_candidates(hr.id, job_id, &dto).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
