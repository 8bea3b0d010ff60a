use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::applications::services::ApplicationService;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::interviews::dtos::{
    check_future, CreateInterviewDto, InterviewDto, InterviewFeedbackDto, InterviewListQuery,
    UpdateInterviewDto,
};
use crate::features::interviews::models::{Interview, InterviewStatus};
use crate::features::realtime::events::{ApplicationEvent, InterviewEvent};
use crate::features::realtime::{Audience, EventHub, RealtimeEvent};
use crate::features::users::models::UserRole;
use crate::shared::types::Paginated;

const INTERVIEW_COLUMNS: &str = "id, application_id, interviewer_id, interview_type, title, \
     description, scheduled_at, duration_minutes, location, meeting_link, status, feedback, \
     rating, recommendation, completed_at, created_at, updated_at";

/// Interviews joined with application, job and candidate. Alias `i`, `a`, `j`, `r`, `u`.
const INTERVIEW_DETAIL_SELECT: &str = r#"
    SELECT i.id, i.application_id, i.interviewer_id, i.interview_type, i.title,
           i.description, i.scheduled_at, i.duration_minutes, i.location, i.meeting_link,
           i.status, i.feedback, i.rating, i.recommendation, i.completed_at,
           i.created_at, i.updated_at,
           j.id AS job_id, j.title AS job_title, j.company, j.created_by AS hr_id,
           u.id AS candidate_id, u.name AS candidate_name, u.email AS candidate_email
    FROM interviews i
    JOIN applications a ON a.id = i.application_id
    JOIN jobs j ON j.id = a.job_id
    JOIN resumes r ON r.id = a.resume_id
    JOIN users u ON u.id = r.user_id
"#;

/// $1 user, $2 true when the user is HR. HR sees interviews on its jobs,
/// candidates see their own.
const PARTICIPANT_FILTER: &str =
    "CASE WHEN $2 THEN j.created_by = $1 ELSE r.user_id = $1 END";

const UPCOMING_LIMIT: i64 = 100;

/// Which side of the table the caller sits on
fn scope(user: &AuthenticatedUser) -> Result<bool> {
    match user.role {
        Some(UserRole::Hr) => Ok(true),
        Some(UserRole::Candidate) => Ok(false),
        None => Err(AppError::Forbidden(
            "Select a role before using this feature".to_string(),
        )),
    }
}

/// Service for interview scheduling and feedback
pub struct InterviewService {
    pool: PgPool,
    applications: Arc<ApplicationService>,
    hub: Arc<EventHub>,
}

impl InterviewService {
    pub fn new(pool: PgPool, applications: Arc<ApplicationService>, hub: Arc<EventHub>) -> Self {
        Self {
            pool,
            applications,
            hub,
        }
    }

    fn participants(interview: &InterviewDto) -> Audience {
        Audience::Users(vec![interview.candidate_id, interview.hr_id])
    }

    fn event(interview: &InterviewDto) -> InterviewEvent {
        InterviewEvent {
            interview_id: interview.id,
            application_id: interview.application_id,
            scheduled_at: interview.scheduled_at,
        }
    }

    /// Books an interview and moves a pending or reviewed application forward
    pub async fn create(&self, hr_id: Uuid, dto: CreateInterviewDto) -> Result<InterviewDto> {
        check_future(dto.scheduled_at, Utc::now())?;

        let access = self
            .applications
            .access_as_owner(hr_id, dto.application_id)
            .await?;
        if access.status.is_terminal() {
            return Err(AppError::Conflict(
                "Cannot schedule an interview for a withdrawn application".to_string(),
            ));
        }

        // The insert only happens while the application is still open
        let interview = sqlx::query_as::<_, Interview>(&format!(
            r#"
            INSERT INTO interviews (
                id, application_id, interviewer_id, interview_type, title, description,
                scheduled_at, duration_minutes, location, meeting_link
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
            WHERE EXISTS (
                SELECT 1 FROM applications WHERE id = $2 AND status <> 'withdrawn'
            )
            RETURNING {}
            "#,
            INTERVIEW_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(access.id)
        .bind(hr_id)
        .bind(dto.interview_type)
        .bind(dto.title.trim())
        .bind(dto.description.as_deref().map(str::trim))
        .bind(dto.scheduled_at)
        .bind(dto.duration_minutes)
        .bind(dto.location.as_deref().map(str::trim))
        .bind(dto.meeting_link.as_deref().map(str::trim))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create interview: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| {
            AppError::Conflict(
                "Cannot schedule an interview for a withdrawn application".to_string(),
            )
        })?;

        tracing::info!(
            "Interview {} scheduled for application {} at {}",
            interview.id,
            access.id,
            interview.scheduled_at
        );

        self.applications.advance_for_interview(&access).await?;

        let detail = self.detail(interview.id).await?;
        self.hub.publish(
            Self::participants(&detail),
            RealtimeEvent::InterviewScheduled(Self::event(&detail)),
        );

        Ok(detail)
    }

    async fn detail(&self, id: Uuid) -> Result<InterviewDto> {
        sqlx::query_as::<_, InterviewDto>(&format!("{} WHERE i.id = $1", INTERVIEW_DETAIL_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch interview {}: {:?}", id, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("Interview not found".to_string()))
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<InterviewDto> {
        let interview = self.detail(id).await?;
        if interview.hr_id != user.id && interview.candidate_id != user.id {
            return Err(AppError::Forbidden(
                "You do not have access to this interview".to_string(),
            ));
        }
        Ok(interview)
    }

    async fn get_owned(&self, hr_id: Uuid, id: Uuid) -> Result<InterviewDto> {
        let interview = self.detail(id).await?;
        if interview.hr_id != hr_id {
            return Err(AppError::Forbidden(
                "You can only manage interviews for your own jobs".to_string(),
            ));
        }
        Ok(interview)
    }

    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        query: &InterviewListQuery,
    ) -> Result<Paginated<InterviewDto>> {
        let is_hr = scope(user)?;
        if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
            if from > to {
                return Err(AppError::Validation(
                    "date_from cannot be after date_to".to_string(),
                ));
            }
        }

        let pagination = query.pagination();
        let filter = format!(
            r#"
            WHERE {}
              AND ($3::interview_status IS NULL OR i.status = $3)
              AND ($4::timestamptz IS NULL OR i.scheduled_at >= $4)
              AND ($5::timestamptz IS NULL OR i.scheduled_at <= $5)
            "#,
            PARTICIPANT_FILTER
        );

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM interviews i
            JOIN applications a ON a.id = i.application_id
            JOIN jobs j ON j.id = a.job_id
            JOIN resumes r ON r.id = a.resume_id
            {}
            "#,
            filter
        ))
        .bind(user.id)
        .bind(is_hr)
        .bind(query.status)
        .bind(query.date_from)
        .bind(query.date_to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count interviews for {}: {:?}", user.id, e);
            AppError::Database(e)
        })?;

        let items = sqlx::query_as::<_, InterviewDto>(&format!(
            "{} {} ORDER BY i.scheduled_at ASC LIMIT $6 OFFSET $7",
            INTERVIEW_DETAIL_SELECT, filter
        ))
        .bind(user.id)
        .bind(is_hr)
        .bind(query.status)
        .bind(query.date_from)
        .bind(query.date_to)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list interviews for {}: {:?}", user.id, e);
            AppError::Database(e)
        })?;

        Ok(Paginated::new(items, total, &pagination))
    }

    /// Scheduled interviews in the next `days` days, soonest first
    pub async fn upcoming(&self, user: &AuthenticatedUser, days: i64) -> Result<Vec<InterviewDto>> {
        let is_hr = scope(user)?;
        let now = Utc::now();

        sqlx::query_as::<_, InterviewDto>(&format!(
            r#"
            {}
            WHERE {}
              AND i.status IN ('scheduled', 'rescheduled')
              AND i.scheduled_at >= $3
              AND i.scheduled_at <= $4
            ORDER BY i.scheduled_at ASC
            LIMIT $5
            "#,
            INTERVIEW_DETAIL_SELECT, PARTICIPANT_FILTER
        ))
        .bind(user.id)
        .bind(is_hr)
        .bind(now)
        .bind(now + Duration::days(days))
        .bind(UPCOMING_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch upcoming interviews: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Partial update. Moving to `completed` stamps `completed_at`.
    pub async fn update(
        &self,
        hr_id: Uuid,
        id: Uuid,
        dto: UpdateInterviewDto,
    ) -> Result<InterviewDto> {
        let current = self.get_owned(hr_id, id).await?;

        if let Some(scheduled_at) = dto.scheduled_at {
            if scheduled_at != current.scheduled_at {
                check_future(scheduled_at, Utc::now())?;
            }
        }

        sqlx::query(
            r#"
            UPDATE interviews
            SET interview_type = COALESCE($2, interview_type),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                scheduled_at = COALESCE($5, scheduled_at),
                duration_minutes = COALESCE($6, duration_minutes),
                location = COALESCE($7, location),
                meeting_link = COALESCE($8, meeting_link),
                status = COALESCE($9, status),
                completed_at = CASE
                    WHEN COALESCE($9, status) = 'completed' THEN COALESCE(completed_at, NOW())
                    ELSE completed_at
                END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(dto.interview_type)
        .bind(dto.title.as_deref().map(str::trim))
        .bind(dto.description.as_deref().map(str::trim))
        .bind(dto.scheduled_at)
        .bind(dto.duration_minutes)
        .bind(dto.location.as_deref().map(str::trim))
        .bind(dto.meeting_link.as_deref().map(str::trim))
        .bind(dto.status)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update interview {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        let updated = self.detail(id).await?;
        self.hub.publish(
            Self::participants(&updated),
            RealtimeEvent::InterviewUpdated(Self::event(&updated)),
        );

        Ok(updated)
    }

    /// Marks the interview cancelled; the row is kept
    pub async fn cancel(&self, hr_id: Uuid, id: Uuid) -> Result<InterviewDto> {
        let current = self.get_owned(hr_id, id).await?;
        match current.status {
            InterviewStatus::Cancelled => {
                return Err(AppError::Conflict(
                    "Interview is already cancelled".to_string(),
                ))
            }
            InterviewStatus::Completed => {
                return Err(AppError::Conflict(
                    "Completed interviews cannot be cancelled".to_string(),
                ))
            }
            InterviewStatus::Scheduled | InterviewStatus::Rescheduled => {}
        }

        self.set_status(id, InterviewStatus::Cancelled).await?;

        tracing::info!("Interview {} cancelled", id);
        let cancelled = self.detail(id).await?;
        self.hub.publish(
            Self::participants(&cancelled),
            RealtimeEvent::InterviewCancelled(Self::event(&cancelled)),
        );

        Ok(cancelled)
    }

    async fn set_status(&self, id: Uuid, status: InterviewStatus) -> Result<()> {
        sqlx::query("UPDATE interviews SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to set interview {} to {}: {:?}", id, status, e);
                AppError::Database(e)
            })?;
        Ok(())
    }

    /// Records the interviewer's verdict and completes the interview
    pub async fn add_feedback(
        &self,
        hr_id: Uuid,
        id: Uuid,
        dto: InterviewFeedbackDto,
    ) -> Result<InterviewDto> {
        let current = self.get_owned(hr_id, id).await?;
        if current.status == InterviewStatus::Cancelled {
            return Err(AppError::Conflict(
                "Cannot add feedback to a cancelled interview".to_string(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE interviews
            SET feedback = $2,
                rating = $3,
                recommendation = $4,
                status = 'completed',
                completed_at = COALESCE(completed_at, NOW()),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(dto.feedback.trim())
        .bind(dto.rating)
        .bind(dto.recommendation)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store feedback for interview {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        let completed = self.detail(id).await?;
        self.hub.publish(
            Self::participants(&completed),
            RealtimeEvent::ApplicationFeedbackAdded(ApplicationEvent {
                application_id: completed.application_id,
                job_id: completed.job_id,
            }),
        );

        Ok(completed)
    }
}
