use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::applications::dtos::{status_counts, ApplicationDetailDto};
use crate::features::applications::models::ApplicationStatus;
use crate::features::applications::services::application_service::APPLICATION_DETAIL_SELECT;
use crate::features::hr::dtos::{
    check_bulk_ids, BulkApplicationAction, BulkApplicationActionDto, BulkApplicationResultDto,
    BulkJobAction, BulkJobActionDto, BulkJobResultDto, HrApplicationListQuery, HrJobListQuery,
    HrJobRow, HrMetricsDto,
};
use crate::features::jobs::services::job_service::JOB_COLUMNS;
use crate::features::realtime::events::{BulkApplicationEvent, JobEvent};
use crate::features::realtime::{Audience, EventHub, RealtimeEvent};
use crate::shared::types::Paginated;
use crate::shared::validation::{like_pattern, search_term};

/// $1 owner, $2 is_active, $3 created since, $4 search pattern
const HR_JOB_FILTER: &str = r#"
    WHERE created_by = $1
      AND deleted_at IS NULL
      AND ($2::bool IS NULL OR is_active = $2)
      AND ($3::timestamptz IS NULL OR created_at >= $3)
      AND ($4::text IS NULL OR title ILIKE $4 OR company ILIKE $4 OR location ILIKE $4)
"#;

/// $1 owner, $2 job, $3 status, $4 search pattern, $5 min score, $6 from, $7 to
const HR_APPLICATION_FILTER: &str = r#"
    WHERE j.created_by = $1
      AND ($2::uuid IS NULL OR a.job_id = $2)
      AND ($3::application_status IS NULL OR a.status = $3)
      AND ($4::text IS NULL OR u.name ILIKE $4 OR u.email ILIKE $4
           OR j.title ILIKE $4 OR r.filename ILIKE $4)
      AND ($5::float8 IS NULL OR a.match_score >= $5)
      AND ($6::timestamptz IS NULL OR a.created_at >= $6)
      AND ($7::timestamptz IS NULL OR a.created_at < $7)
"#;

const RECENT_ACTIVITY_LIMIT: i64 = 10;
const RECENT_WINDOW_DAYS: i64 = 7;

/// Recruiter views across all of the caller's jobs
pub struct HrService {
    pool: PgPool,
    hub: Arc<EventHub>,
}

impl HrService {
    pub fn new(pool: PgPool, hub: Arc<EventHub>) -> Self {
        Self { pool, hub }
    }

    pub async fn list_jobs(
        &self,
        user_id: Uuid,
        query: &HrJobListQuery,
    ) -> Result<Paginated<HrJobRow>> {
        let pagination = query.pagination();
        let is_active = query.status.is_active();
        let since = query.date_range.since(Utc::now());
        let search = search_term(query.search.as_deref()).map(like_pattern);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM jobs {}", HR_JOB_FILTER))
                .bind(user_id)
                .bind(is_active)
                .bind(since)
                .bind(&search)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count jobs for {}: {:?}", user_id, e);
                    AppError::Database(e)
                })?;

        let rows = sqlx::query_as::<_, HrJobRow>(&format!(
            r#"
            SELECT {},
                   (SELECT COUNT(*) FROM applications a WHERE a.job_id = jobs.id) AS application_count
            FROM jobs
            {}
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
            JOB_COLUMNS, HR_JOB_FILTER
        ))
        .bind(user_id)
        .bind(is_active)
        .bind(since)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list jobs for {}: {:?}", user_id, e);
            AppError::Database(e)
        })?;

        Ok(Paginated::new(rows, total, &pagination))
    }

    pub async fn bulk_jobs(&self, user_id: Uuid, dto: &BulkJobActionDto) -> Result<BulkJobResultDto> {
        let ids = check_bulk_ids(&dto.job_ids)?;

        let statement = match dto.action {
            BulkJobAction::Activate => {
                "UPDATE jobs SET is_active = TRUE, updated_at = NOW() \
                 WHERE id = ANY($1) AND created_by = $2 AND deleted_at IS NULL RETURNING id"
            }
            BulkJobAction::Deactivate => {
                "UPDATE jobs SET is_active = FALSE, updated_at = NOW() \
                 WHERE id = ANY($1) AND created_by = $2 AND deleted_at IS NULL RETURNING id"
            }
            BulkJobAction::Delete => {
                "UPDATE jobs SET deleted_at = NOW(), is_active = FALSE, updated_at = NOW() \
                 WHERE id = ANY($1) AND created_by = $2 AND deleted_at IS NULL RETURNING id"
            }
        };

        let affected: Vec<Uuid> = sqlx::query_scalar(statement)
            .bind(ids.as_slice())
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Bulk job action {:?} failed: {:?}", dto.action, e);
                AppError::Database(e)
            })?;

        tracing::info!(
            "Bulk {:?} on {}/{} jobs by {}",
            dto.action,
            affected.len(),
            ids.len(),
            user_id
        );

        for job_id in &affected {
            let event = match dto.action {
                BulkJobAction::Delete => RealtimeEvent::JobDeleted(JobEvent {
                    job_id: *job_id,
                    title: None,
                    is_active: None,
                }),
                BulkJobAction::Activate | BulkJobAction::Deactivate => {
                    RealtimeEvent::JobUpdated(JobEvent {
                        job_id: *job_id,
                        title: None,
                        is_active: Some(dto.action == BulkJobAction::Activate),
                    })
                }
            };
            self.hub.publish(Audience::Everyone, event);
        }

        Ok(BulkJobResultDto {
            action: dto.action,
            requested_count: ids.len(),
            affected_count: affected.len(),
        })
    }

    pub async fn list_applications(
        &self,
        user_id: Uuid,
        query: &HrApplicationListQuery,
    ) -> Result<Paginated<ApplicationDetailDto>> {
        let (created_from, created_to) = query.created_bounds()?;
        let pagination = query.pagination();
        let search = search_term(query.search.as_deref()).map(like_pattern);

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            JOIN resumes r ON r.id = a.resume_id
            JOIN users u ON u.id = r.user_id
            {}
            "#,
            HR_APPLICATION_FILTER
        ))
        .bind(user_id)
        .bind(query.job_id)
        .bind(query.status)
        .bind(&search)
        .bind(query.min_match_score)
        .bind(created_from)
        .bind(created_to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count applications for {}: {:?}", user_id, e);
            AppError::Database(e)
        })?;

        let items = sqlx::query_as::<_, ApplicationDetailDto>(&format!(
            "{} {} ORDER BY {} {} NULLS LAST, a.id LIMIT $8 OFFSET $9",
            APPLICATION_DETAIL_SELECT,
            HR_APPLICATION_FILTER,
            query.sort_by.column(),
            query.sort_order.as_sql()
        ))
        .bind(user_id)
        .bind(query.job_id)
        .bind(query.status)
        .bind(&search)
        .bind(query.min_match_score)
        .bind(created_from)
        .bind(created_to)
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

    /// Withdrawn applications are left alone by `set_status`
    pub async fn bulk_applications(
        &self,
        user_id: Uuid,
        dto: &BulkApplicationActionDto,
    ) -> Result<BulkApplicationResultDto> {
        let ids = check_bulk_ids(&dto.application_ids)?;

        let result = match dto.action {
            BulkApplicationAction::SetStatus => {
                let status = dto.status.ok_or_else(|| {
                    AppError::Validation("status is required for set_status".to_string())
                })?;
                if status == ApplicationStatus::Withdrawn {
                    return Err(AppError::BadRequest(
                        "Only the candidate can withdraw an application".to_string(),
                    ));
                }

                sqlx::query_as::<_, (Uuid, Uuid)>(
                    r#"
                    UPDATE applications a
                    SET status = $3, updated_at = NOW()
                    FROM jobs j, resumes r
                    WHERE a.job_id = j.id
                      AND a.resume_id = r.id
                      AND j.created_by = $2
                      AND a.id = ANY($1)
                      AND a.status <> 'withdrawn'
                    RETURNING a.id, r.user_id
                    "#,
                )
                .bind(ids.as_slice())
                .bind(user_id)
                .bind(status)
                .fetch_all(&self.pool)
                .await
            }
            BulkApplicationAction::Delete => {
                sqlx::query_as::<_, (Uuid, Uuid)>(
                    r#"
                    DELETE FROM applications a
                    USING jobs j, resumes r
                    WHERE a.job_id = j.id
                      AND a.resume_id = r.id
                      AND j.created_by = $2
                      AND a.id = ANY($1)
                    RETURNING a.id, r.user_id
                    "#,
                )
                .bind(ids.as_slice())
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            }
        };

        let affected = result.map_err(|e| {
            tracing::error!("Bulk application action {:?} failed: {:?}", dto.action, e);
            AppError::Database(e)
        })?;

        let application_ids: Vec<Uuid> = affected.iter().map(|(id, _)| *id).collect();
        let mut audience: Vec<Uuid> = affected.iter().map(|(_, candidate)| *candidate).collect();
        audience.push(user_id);
        audience.sort();
        audience.dedup();

        let action = match dto.action {
            BulkApplicationAction::SetStatus => "set_status",
            BulkApplicationAction::Delete => "delete",
        };
        tracing::info!(
            "Bulk {} on {}/{} applications by {}",
            action,
            application_ids.len(),
            ids.len(),
            user_id
        );

        let count = application_ids.len();
        self.hub.publish(
            Audience::Users(audience),
            RealtimeEvent::BulkApplicationUpdate(BulkApplicationEvent {
                action: action.to_string(),
                application_ids,
                count,
            }),
        );

        Ok(BulkApplicationResultDto {
            action: dto.action,
            requested_count: ids.len(),
            affected_count: count,
        })
    }

    /// Counts cover live jobs only; soft-deleted postings and their
    /// applications are left out
    pub async fn metrics(&self, user_id: Uuid) -> Result<HrMetricsDto> {
        let (total_jobs, active_jobs): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active)
            FROM jobs
            WHERE created_by = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count jobs for metrics: {:?}", e);
            AppError::Database(e)
        })?;

        let rows = sqlx::query_as::<_, (ApplicationStatus, i64)>(
            r#"
            SELECT a.status, COUNT(*)
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE j.created_by = $1 AND j.deleted_at IS NULL
            GROUP BY a.status
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count applications by status: {:?}", e);
            AppError::Database(e)
        })?;

        let recent_applications: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE j.created_by = $1 AND j.deleted_at IS NULL AND a.created_at >= $2
            "#,
        )
        .bind(user_id)
        .bind(Utc::now() - Duration::days(RECENT_WINDOW_DAYS))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count recent applications: {:?}", e);
            AppError::Database(e)
        })?;

        let recent_activity = sqlx::query_as::<_, ApplicationDetailDto>(&format!(
            "{} WHERE j.created_by = $1 AND j.deleted_at IS NULL \
             ORDER BY a.created_at DESC LIMIT $2",
            APPLICATION_DETAIL_SELECT
        ))
        .bind(user_id)
        .bind(RECENT_ACTIVITY_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch recent activity: {:?}", e);
            AppError::Database(e)
        })?;

        let total_applications: i64 = rows.iter().map(|(_, count)| count).sum();
        let pending_applications = rows
            .iter()
            .find(|(status, _)| *status == ApplicationStatus::Pending)
            .map(|(_, count)| *count)
            .unwrap_or(0);

        Ok(HrMetricsDto {
            total_jobs,
            active_jobs,
            total_applications,
            pending_applications,
            recent_applications,
            average_applications_per_job: average_per_job(total_applications, total_jobs),
            status_breakdown: status_counts(&rows),
            recent_activity,
        })
    }
}

/// Rounded to two decimals, zero without jobs
fn average_per_job(applications: i64, jobs: i64) -> f64 {
    if jobs <= 0 {
        return 0.0;
    }
    ((applications as f64 / jobs as f64) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::models::UserRole;
    use crate::shared::test_helpers::{
        seed_application, seed_job, seed_resume, seed_user, test_hub,
    };

    #[test]
    fn test_average_per_job() {
        assert_eq!(average_per_job(0, 0), 0.0);
        assert_eq!(average_per_job(10, 4), 2.5);
        assert_eq!(average_per_job(1, 3), 0.33);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_bulk_status_counts_only_own_applications(pool: PgPool) {
        let hub = test_hub();
        let mut events = hub.subscribe();
        let service = HrService::new(pool.clone(), Arc::clone(&hub));

        let hr = seed_user(&pool, UserRole::Hr).await;
        let rival = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let own_job = seed_job(&pool, hr.id, &["Rust"]).await;
        let rival_job = seed_job(&pool, rival.id, &["Rust"]).await;
        let resume = seed_resume(&pool, candidate.id, &["rust"]).await;
        let own = seed_application(&pool, resume, own_job).await;
        let foreign = seed_application(&pool, resume, rival_job).await;

        let dto = BulkApplicationActionDto {
            action: BulkApplicationAction::SetStatus,
            status: Some(ApplicationStatus::Shortlisted),
            application_ids: vec![own, foreign, Uuid::now_v7()],
        };
        let result = service.bulk_applications(hr.id, &dto).await.unwrap();

        assert_eq!(result.requested_count, 3);
        assert_eq!(result.affected_count, 1);

        let status: ApplicationStatus =
            sqlx::query_scalar("SELECT status FROM applications WHERE id = $1")
                .bind(foreign)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, ApplicationStatus::Pending);

        let envelope = events.recv().await.unwrap();
        assert_eq!(
            envelope.event,
            RealtimeEvent::BulkApplicationUpdate(BulkApplicationEvent {
                action: "set_status".to_string(),
                application_ids: vec![own],
                count: 1,
            })
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_metrics_ignore_deleted_jobs(pool: PgPool) {
        let service = HrService::new(pool.clone(), test_hub());
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let live_job = seed_job(&pool, hr.id, &["Rust"]).await;
        let gone_job = seed_job(&pool, hr.id, &["Go"]).await;
        let resume = seed_resume(&pool, candidate.id, &["rust"]).await;
        seed_application(&pool, resume, live_job).await;
        seed_application(&pool, resume, gone_job).await;

        sqlx::query("UPDATE jobs SET deleted_at = NOW(), is_active = FALSE WHERE id = $1")
            .bind(gone_job)
            .execute(&pool)
            .await
            .unwrap();

        let metrics = service.metrics(hr.id).await.unwrap();
        assert_eq!(metrics.total_jobs, 1);
        assert_eq!(metrics.total_applications, 1);
        assert_eq!(metrics.pending_applications, 1);
        assert_eq!(metrics.recent_applications, 1);
        assert_eq!(metrics.status_breakdown["pending"], 1);
        assert_eq!(metrics.recent_activity.len(), 1);
        assert_eq!(metrics.recent_activity[0].job_id, live_job);
        assert_eq!(metrics.average_applications_per_job, 1.0);
    }
}
