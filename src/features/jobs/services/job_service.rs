use sqlx::types::Json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::jobs::dtos::{
    check_salary_range, CountByKeyDto, CreateJobDto, JobDeletionDto, JobListQuery,
    JobStatisticsDto, UpdateJobDto,
};
use crate::features::jobs::models::{Job, NewJob};
use crate::features::realtime::events::JobEvent;
use crate::features::realtime::{Audience, EventHub, RealtimeEvent};
use crate::shared::types::Paginated;
use crate::shared::validation::{like_pattern, search_term};

pub(crate) const JOB_COLUMNS: &str = "id, created_by, title, company, description, requirements, \
     location, salary_min, salary_max, employment_type, category, is_active, deleted_at, \
     created_at, updated_at";

/// Shared WHERE clause for the job list and its count.
///
/// $1 owner (HR callers only), $2 category, $3 location pattern,
/// $4 salary floor, $5 salary ceiling, $6 employment type, $7 search pattern.
const JOB_LIST_FILTER: &str = r#"
    WHERE deleted_at IS NULL
      AND (($1::uuid IS NULL AND is_active) OR created_by = $1)
      AND ($2::text IS NULL OR category = $2)
      AND ($3::text IS NULL OR location ILIKE $3)
      AND ($4::int IS NULL OR salary_max >= $4)
      AND ($5::int IS NULL OR salary_min <= $5)
      AND ($6::text IS NULL OR LOWER(employment_type) = LOWER($6))
      AND ($7::text IS NULL OR title ILIKE $7 OR company ILIKE $7
           OR description ILIKE $7 OR location ILIKE $7)
"#;

const TOP_LOCATIONS: i64 = 10;

/// Service for job postings
pub struct JobService {
    pool: PgPool,
    hub: Arc<EventHub>,
}

impl JobService {
    pub fn new(pool: PgPool, hub: Arc<EventHub>) -> Self {
        Self { pool, hub }
    }

    fn publish(&self, event: RealtimeEvent) {
        self.hub.publish(Audience::Everyone, event);
    }

    pub async fn create(&self, user: &AuthenticatedUser, dto: CreateJobDto) -> Result<Job> {
        check_salary_range(dto.salary_min, dto.salary_max)?;

        let data = NewJob {
            created_by: user.id,
            title: dto.title.trim().to_string(),
            company: dto.company.trim().to_string(),
            description: dto.description.trim().to_string(),
            requirements: dto.requirements.into_list(),
            location: dto.location.trim().to_string(),
            salary_min: dto.salary_min,
            salary_max: dto.salary_max,
            employment_type: dto.employment_type.trim().to_string(),
            category: dto.category,
            is_active: dto.is_active.unwrap_or(true),
        };

        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (
                id, created_by, title, company, description, requirements, location,
                salary_min, salary_max, employment_type, category, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(data.created_by)
        .bind(&data.title)
        .bind(&data.company)
        .bind(&data.description)
        .bind(Json(&data.requirements))
        .bind(&data.location)
        .bind(data.salary_min)
        .bind(data.salary_max)
        .bind(&data.employment_type)
        .bind(&data.category)
        .bind(data.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create job: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Job {} created by {}", job.id, user.id);
        self.publish(RealtimeEvent::JobCreated(JobEvent {
            job_id: job.id,
            title: Some(job.title.clone()),
            is_active: Some(job.is_active),
        }));

        Ok(job)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>> {
        sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch job {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    /// A job that has not been deleted
    pub async fn get(&self, id: Uuid) -> Result<Job> {
        self.find_by_id(id)
            .await?
            .filter(|job| !job.is_deleted())
            .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
    }

    /// A live job created by the caller
    pub async fn get_owned(&self, user_id: Uuid, id: Uuid) -> Result<Job> {
        let job = self.get(id).await?;
        if job.created_by != user_id {
            return Err(AppError::Forbidden(
                "You can only manage jobs you posted".to_string(),
            ));
        }
        Ok(job)
    }

    pub async fn list(
        &self,
        viewer: &AuthenticatedUser,
        query: &JobListQuery,
    ) -> Result<Paginated<Job>> {
        check_salary_range(query.salary_min, query.salary_max)?;

        let pagination = query.pagination();
        let owner = viewer.is_hr().then_some(viewer.id);
        let category = search_term(query.category.as_deref()).map(|c| c.to_lowercase());
        let location = search_term(query.location.as_deref()).map(like_pattern);
        let employment_type = search_term(query.employment_type.as_deref());
        let search = search_term(query.search.as_deref()).map(like_pattern);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM jobs {}", JOB_LIST_FILTER))
                .bind(owner)
                .bind(&category)
                .bind(&location)
                .bind(query.salary_min)
                .bind(query.salary_max)
                .bind(employment_type)
                .bind(&search)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count jobs: {:?}", e);
                    AppError::Database(e)
                })?;

        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs {} ORDER BY created_at DESC LIMIT $8 OFFSET $9",
            JOB_COLUMNS, JOB_LIST_FILTER
        ))
        .bind(owner)
        .bind(&category)
        .bind(&location)
        .bind(query.salary_min)
        .bind(query.salary_max)
        .bind(employment_type)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list jobs: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(Paginated::new(jobs, total, &pagination))
    }

    /// Newest jobs open for applications
    pub async fn list_open(&self, limit: i64) -> Result<Vec<Job>> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {} FROM jobs
            WHERE is_active AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $1
            "#,
            JOB_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list open jobs: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Merges the given fields into the caller's job
    pub async fn update(&self, user_id: Uuid, id: Uuid, dto: UpdateJobDto) -> Result<Job> {
        let job = self.get_owned(user_id, id).await?;

        let salary_min = dto.salary_min.or(job.salary_min);
        let salary_max = dto.salary_max.or(job.salary_max);
        check_salary_range(salary_min, salary_max)?;

        let requirements = match dto.requirements {
            Some(input) => input.into_list(),
            None => job.requirements.0,
        };

        let updated = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET title = $2,
                company = $3,
                description = $4,
                requirements = $5,
                location = $6,
                salary_min = $7,
                salary_max = $8,
                employment_type = $9,
                category = $10,
                is_active = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(id)
        .bind(dto.title.map(|t| t.trim().to_string()).unwrap_or(job.title))
        .bind(dto.company.map(|c| c.trim().to_string()).unwrap_or(job.company))
        .bind(
            dto.description
                .map(|d| d.trim().to_string())
                .unwrap_or(job.description),
        )
        .bind(Json(requirements))
        .bind(dto.location.map(|l| l.trim().to_string()).unwrap_or(job.location))
        .bind(salary_min)
        .bind(salary_max)
        .bind(
            dto.employment_type
                .map(|t| t.trim().to_string())
                .unwrap_or(job.employment_type),
        )
        .bind(dto.category.unwrap_or(job.category))
        .bind(dto.is_active.unwrap_or(job.is_active))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update job {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        self.publish(RealtimeEvent::JobUpdated(JobEvent {
            job_id: updated.id,
            title: Some(updated.title.clone()),
            is_active: Some(updated.is_active),
        }));

        Ok(updated)
    }

    pub async fn set_active(&self, user_id: Uuid, id: Uuid, is_active: bool) -> Result<Job> {
        self.get_owned(user_id, id).await?;

        let job = sqlx::query_as::<_, Job>(&format!(
            "UPDATE jobs SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            JOB_COLUMNS
        ))
        .bind(id)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update status of job {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        tracing::info!("Job {} is_active set to {}", id, is_active);
        self.publish(RealtimeEvent::JobUpdated(JobEvent {
            job_id: job.id,
            title: None,
            is_active: Some(job.is_active),
        }));

        Ok(job)
    }

    /// Soft delete unless `soft_delete == Some(false)` and nobody applied
    pub async fn delete(
        &self,
        user_id: Uuid,
        id: Uuid,
        soft_delete: Option<bool>,
    ) -> Result<JobDeletionDto> {
        self.get_owned(user_id, id).await?;

        let has_applications: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM applications WHERE job_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to check applications for job {}: {:?}", id, e);
                    AppError::Database(e)
                })?;

        let soft_deleted = soft_delete.unwrap_or(true) || has_applications;

        let query = if soft_deleted {
            "UPDATE jobs SET deleted_at = NOW(), is_active = FALSE, updated_at = NOW() WHERE id = $1"
        } else {
            "DELETE FROM jobs WHERE id = $1"
        };

        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete job {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        tracing::info!("Job {} deleted (soft: {})", id, soft_deleted);
        self.publish(RealtimeEvent::JobDeleted(JobEvent {
            job_id: id,
            title: None,
            is_active: None,
        }));

        Ok(JobDeletionDto { id, soft_deleted })
    }

    /// Counts over active, live jobs
    pub async fn statistics(&self) -> Result<JobStatisticsDto> {
        let total_active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM jobs WHERE is_active AND deleted_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count active jobs: {:?}", e);
            AppError::Database(e)
        })?;

        let by_category = sqlx::query_as::<_, CountByKeyDto>(
            r#"
            SELECT category AS key, COUNT(*) AS count
            FROM jobs
            WHERE is_active AND deleted_at IS NULL
            GROUP BY category
            ORDER BY count DESC, key ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count jobs by category: {:?}", e);
            AppError::Database(e)
        })?;

        let top_locations = sqlx::query_as::<_, CountByKeyDto>(
            r#"
            SELECT location AS key, COUNT(*) AS count
            FROM jobs
            WHERE is_active AND deleted_at IS NULL
            GROUP BY location
            ORDER BY count DESC, key ASC
            LIMIT $1
            "#,
        )
        .bind(TOP_LOCATIONS)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count jobs by location: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(JobStatisticsDto {
            total_active,
            by_category,
            top_locations,
        })
    }
}
