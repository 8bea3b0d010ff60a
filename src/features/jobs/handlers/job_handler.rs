use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireHr;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::jobs::dtos::{
    CreateJobDto, DeleteJobQuery, JobDeletionDto, JobDto, JobListQuery, JobStatisticsDto,
    UpdateJobDto, UpdateJobStatusDto,
};
use crate::features::jobs::services::JobService;
use crate::shared::types::{ApiResponse, Paginated};

/// List jobs
///
/// Candidates see active jobs. HR users see their own postings, including
/// inactive ones.
#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "jobs",
    params(JobListQuery),
    responses(
        (status = 200, description = "Page of jobs", body = ApiResponse<Paginated<JobDto>>),
        (status = 400, description = "Invalid filters"),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_jobs(
    user: AuthenticatedUser,
    State(service): State<Arc<JobService>>,
    Query(query): Query<JobListQuery>,
) -> Result<Json<ApiResponse<Paginated<JobDto>>>> {
    let page = service.list(&user, &query).await?;
    let meta = page.meta();
    let page = Paginated {
        items: page.items.into_iter().map(JobDto::from).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages,
    };

    Ok(Json(ApiResponse::success(Some(page), None, Some(meta))))
}

/// Post a job
#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "jobs",
    request_body = CreateJobDto,
    responses(
        (status = 201, description = "Job created", body = ApiResponse<JobDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "HR role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_job(
    RequireHr(user): RequireHr,
    State(service): State<Arc<JobService>>,
    AppJson(dto): AppJson<CreateJobDto>,
) -> Result<(StatusCode, Json<ApiResponse<JobDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let job = service.create(&user, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(job.into()),
            Some("Job created successfully".to_string()),
            None,
        )),
    ))
}

/// Active job counts by category and location
#[utoipa::path(
    get,
    path = "/api/jobs/statistics",
    tag = "jobs",
    responses(
        (status = 200, description = "Job statistics", body = ApiResponse<JobStatisticsDto>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn job_statistics(
    _user: AuthenticatedUser,
    State(service): State<Arc<JobService>>,
) -> Result<Json<ApiResponse<JobStatisticsDto>>> {
    let stats = service.statistics().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "jobs",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job", body = ApiResponse<JobDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_job(
    _user: AuthenticatedUser,
    State(service): State<Arc<JobService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobDto>>> {
    let job = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(job.into()), None, None)))
}

/// Update a job you posted
#[utoipa::path(
    put,
    path = "/api/jobs/{id}",
    tag = "jobs",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = UpdateJobDto,
    responses(
        (status = 200, description = "Job updated", body = ApiResponse<JobDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_job(
    RequireHr(user): RequireHr,
    State(service): State<Arc<JobService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateJobDto>,
) -> Result<Json<ApiResponse<JobDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let job = service.update(user.id, id, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(job.into()),
        Some("Job updated successfully".to_string()),
        None,
    )))
}

/// Open or close a job for applications
#[utoipa::path(
    patch,
    path = "/api/jobs/{id}/status",
    tag = "jobs",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = UpdateJobStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<JobDto>),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_job_status(
    RequireHr(user): RequireHr,
    State(service): State<Arc<JobService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateJobStatusDto>,
) -> Result<Json<ApiResponse<JobDto>>> {
    let job = service.set_active(user.id, id, dto.is_active).await?;
    let message = if job.is_active {
        "Job activated"
    } else {
        "Job deactivated"
    };

    Ok(Json(ApiResponse::success(
        Some(job.into()),
        Some(message.to_string()),
        None,
    )))
}

/// Delete a job
///
/// Soft delete by default. Jobs that received applications are always
/// soft deleted.
#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    tag = "jobs",
    params(("id" = Uuid, Path, description = "Job ID"), DeleteJobQuery),
    responses(
        (status = 200, description = "Job deleted", body = ApiResponse<JobDeletionDto>),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_job(
    RequireHr(user): RequireHr,
    State(service): State<Arc<JobService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteJobQuery>,
) -> Result<Json<ApiResponse<JobDeletionDto>>> {
    let deletion = service.delete(user.id, id, query.soft_delete).await?;

    Ok(Json(ApiResponse::success(
        Some(deletion),
        Some("Job deleted successfully".to_string()),
        None,
    )))
}
