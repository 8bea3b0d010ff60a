use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::applications::dtos::{ApplicationDetailDto, ApplicationDto};
use crate::features::applications::services::ApplicationService;
use crate::features::auth::guards::RequireHr;
use crate::features::hr::dtos::{
    BulkApplicationActionDto, BulkApplicationResultDto, BulkJobActionDto, BulkJobResultDto,
    FeedbackDto, HrApplicationListQuery, HrJobDto, HrJobListQuery, HrMetricsDto,
};
use crate::features::hr::services::HrService;
use crate::shared::types::{ApiResponse, Paginated};

#[derive(Clone)]
pub struct HrState {
    pub service: Arc<HrService>,
    pub applications: Arc<ApplicationService>,
}

/// Your jobs with application counts
#[utoipa::path(
    get,
    path = "/api/hr/jobs",
    tag = "hr",
    params(HrJobListQuery),
    responses(
        (status = 200, description = "Page of jobs", body = ApiResponse<Paginated<HrJobDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "HR role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_hr_jobs(
    RequireHr(user): RequireHr,
    State(state): State<HrState>,
    Query(query): Query<HrJobListQuery>,
) -> Result<Json<ApiResponse<Paginated<HrJobDto>>>> {
    let page = state.service.list_jobs(user.id, &query).await?;
    let meta = page.meta();
    let page = Paginated {
        items: page.items.into_iter().map(HrJobDto::from).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages,
    };

    Ok(Json(ApiResponse::success(Some(page), None, Some(meta))))
}

/// Activate, deactivate or delete several jobs
#[utoipa::path(
    post,
    path = "/api/hr/jobs/bulk",
    tag = "hr",
    request_body = BulkJobActionDto,
    responses(
        (status = 200, description = "Bulk action applied", body = ApiResponse<BulkJobResultDto>),
        (status = 400, description = "No ids or too many ids"),
        (status = 403, description = "HR role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn bulk_job_action(
    RequireHr(user): RequireHr,
    State(state): State<HrState>,
    AppJson(dto): AppJson<BulkJobActionDto>,
) -> Result<Json<ApiResponse<BulkJobResultDto>>> {
    let result = state.service.bulk_jobs(user.id, &dto).await?;
    let message = format!("{} of {} jobs updated", result.affected_count, result.requested_count);

    Ok(Json(ApiResponse::success(Some(result), Some(message), None)))
}

/// Applications to your jobs
#[utoipa::path(
    get,
    path = "/api/hr/applications",
    tag = "hr",
    params(HrApplicationListQuery),
    responses(
        (status = 200, description = "Page of applications", body = ApiResponse<Paginated<ApplicationDetailDto>>),
        (status = 400, description = "Invalid filters"),
        (status = 403, description = "HR role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_hr_applications(
    RequireHr(user): RequireHr,
    State(state): State<HrState>,
    Query(query): Query<HrApplicationListQuery>,
) -> Result<Json<ApiResponse<Paginated<ApplicationDetailDto>>>> {
    let page = state.service.list_applications(user.id, &query).await?;
    let meta = page.meta();
    Ok(Json(ApiResponse::success(Some(page), None, Some(meta))))
}

/// Set the status of, or delete, several applications
#[utoipa::path(
    post,
    path = "/api/hr/applications/bulk",
    tag = "hr",
    request_body = BulkApplicationActionDto,
    responses(
        (status = 200, description = "Bulk action applied", body = ApiResponse<BulkApplicationResultDto>),
        (status = 400, description = "Missing status, or no ids or too many ids"),
        (status = 403, description = "HR role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn bulk_application_action(
    RequireHr(user): RequireHr,
    State(state): State<HrState>,
    AppJson(dto): AppJson<BulkApplicationActionDto>,
) -> Result<Json<ApiResponse<BulkApplicationResultDto>>> {
    let result = state.service.bulk_applications(user.id, &dto).await?;
    let message = format!(
        "{} of {} applications updated",
        result.affected_count, result.requested_count
    );

    Ok(Json(ApiResponse::success(Some(result), Some(message), None)))
}

#[utoipa::path(
    put,
    path = "/api/hr/applications/{id}/feedback",
    tag = "hr",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = FeedbackDto,
    responses(
        (status = 200, description = "Feedback stored", body = ApiResponse<ApplicationDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_application_feedback(
    RequireHr(user): RequireHr,
    State(state): State<HrState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<FeedbackDto>,
) -> Result<Json<ApiResponse<ApplicationDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let application = state
        .applications
        .set_feedback(user.id, id, &dto.feedback)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(application.into()),
        Some("Feedback saved".to_string()),
        None,
    )))
}

/// Hiring funnel totals for your jobs
#[utoipa::path(
    get,
    path = "/api/hr/metrics",
    tag = "hr",
    responses(
        (status = 200, description = "Metrics", body = ApiResponse<HrMetricsDto>),
        (status = 403, description = "HR role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn hr_metrics(
    RequireHr(user): RequireHr,
    State(state): State<HrState>,
) -> Result<Json<ApiResponse<HrMetricsDto>>> {
    let metrics = state.service.metrics(user.id).await?;
    Ok(Json(ApiResponse::success(Some(metrics), None, None)))
}
