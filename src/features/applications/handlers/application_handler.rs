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
use crate::features::applications::dtos::{
    ApplicationDetailDto, ApplicationDto, ApplicationListQuery, ApplicationStatsDto,
    ApplyJobDto, ApplyResponseDto, BestMatchesDto, CompareCandidatesDto, JobMatchRequestDto,
    JobMatchResultsDto, MatchAnalysisDto, ResumeJobMatchDto, SkillGapDto,
    UpdateApplicationStatusDto,
};
use crate::features::applications::services::ApplicationService;
use crate::features::auth::guards::{RequireCandidate, RequireHr};
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::types::{ApiResponse, Paginated};

/// Apply to a job with one of your resumes
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/apply",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = ApplyJobDto,
    responses(
        (status = 201, description = "Application submitted", body = ApiResponse<ApplyResponseDto>),
        (status = 400, description = "Job closed or invalid input"),
        (status = 403, description = "Candidate role required"),
        (status = 404, description = "Job or resume not found"),
        (status = 409, description = "Already applied with this resume")
    ),
    security(("bearer_auth" = []))
)]
pub async fn apply_to_job(
    RequireCandidate(user): RequireCandidate,
    State(service): State<Arc<ApplicationService>>,
    Path(job_id): Path<Uuid>,
    AppJson(dto): AppJson<ApplyJobDto>,
) -> Result<(StatusCode, Json<ApiResponse<ApplyResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let result = service.apply(&user, job_id, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(result),
            Some("Application submitted successfully".to_string()),
            None,
        )),
    ))
}

/// Rank resumes against a job by keyword overlap
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/match-analysis",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = JobMatchRequestDto,
    responses(
        (status = 200, description = "Ranked resumes", body = ApiResponse<JobMatchResultsDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn rank_job_candidates(
    RequireHr(user): RequireHr,
    State(service): State<Arc<ApplicationService>>,
    Path(job_id): Path<Uuid>,
    AppJson(dto): AppJson<JobMatchRequestDto>,
) -> Result<Json<ApiResponse<JobMatchResultsDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let results = service.rank_for_job(user.id, job_id, &dto).await?;
    Ok(Json(ApiResponse::success(Some(results), None, None)))
}

/// List your applications
#[utoipa::path(
    get,
    path = "/api/jobs/applications",
    tag = "applications",
    params(ApplicationListQuery),
    responses(
        (status = 200, description = "Page of applications", body = ApiResponse<Paginated<ApplicationDetailDto>>),
        (status = 403, description = "Candidate role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_applications(
    RequireCandidate(user): RequireCandidate,
    State(service): State<Arc<ApplicationService>>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<Json<ApiResponse<Paginated<ApplicationDetailDto>>>> {
    let page = service.list_for_candidate(user.id, &query).await?;
    let meta = page.meta();
    Ok(Json(ApiResponse::success(Some(page), None, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/jobs/applications/stats/me",
    tag = "applications",
    responses(
        (status = 200, description = "Application statistics", body = ApiResponse<ApplicationStatsDto>),
        (status = 403, description = "Candidate role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_application_stats(
    RequireCandidate(user): RequireCandidate,
    State(service): State<Arc<ApplicationService>>,
) -> Result<Json<ApiResponse<ApplicationStatsDto>>> {
    let stats = service.stats_for_candidate(user.id).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/applications/{id}",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application", body = ApiResponse<ApplicationDetailDto>),
        (status = 403, description = "Not a participant of this application"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_application(
    user: AuthenticatedUser,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ApplicationDetailDto>>> {
    let application = service.get(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(application), None, None)))
}

/// Withdraw your application
#[utoipa::path(
    post,
    path = "/api/jobs/applications/{id}/withdraw",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application withdrawn", body = ApiResponse<ApplicationDto>),
        (status = 403, description = "Not your application"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Already withdrawn")
    ),
    security(("bearer_auth" = []))
)]
pub async fn withdraw_application(
    RequireCandidate(user): RequireCandidate,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ApplicationDto>>> {
    let application = service.withdraw(user.id, id).await?;

    Ok(Json(ApiResponse::success(
        Some(application.into()),
        Some("Application withdrawn".to_string()),
        None,
    )))
}

/// Change the status of an application to one of your jobs
#[utoipa::path(
    put,
    path = "/api/jobs/applications/{id}",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateApplicationStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<ApplicationDto>),
        (status = 400, description = "Status not allowed"),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application was withdrawn")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_application_status(
    RequireHr(user): RequireHr,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateApplicationStatusDto>,
) -> Result<Json<ApiResponse<ApplicationDto>>> {
    let application = service.update_status(user.id, id, dto.status).await?;

    Ok(Json(ApiResponse::success(
        Some(application.into()),
        Some("Application status updated".to_string()),
        None,
    )))
}

/// Keyword match breakdown and optional model analysis
#[utoipa::path(
    get,
    path = "/api/jobs/applications/{id}/match-analysis",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Match analysis", body = ApiResponse<MatchAnalysisDto>),
        (status = 403, description = "Not a participant of this application"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn application_match_analysis(
    user: AuthenticatedUser,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MatchAnalysisDto>>> {
    let analysis = service.match_analysis(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(analysis), None, None)))
}

/// Preview how one of your resumes matches a job before applying
#[utoipa::path(
    get,
    path = "/api/jobs/{id}/match-with-resume/{resume_id}",
    tag = "applications",
    params(
        ("id" = Uuid, Path, description = "Job ID"),
        ("resume_id" = Uuid, Path, description = "Resume ID")
    ),
    responses(
        (status = 200, description = "Keyword match", body = ApiResponse<ResumeJobMatchDto>),
        (status = 403, description = "Candidate role required or not your resume"),
        (status = 404, description = "Job or resume not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn match_job_with_resume(
    RequireCandidate(user): RequireCandidate,
    State(service): State<Arc<ApplicationService>>,
    Path((job_id, resume_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<ResumeJobMatchDto>>> {
    let result = service.match_with_resume(user.id, job_id, resume_id).await?;
    Ok(Json(ApiResponse::success(Some(result), None, None)))
}

/// Best open jobs for each of your resumes
#[utoipa::path(
    get,
    path = "/api/jobs/best-matches/user-resumes",
    tag = "applications",
    responses(
        (status = 200, description = "Matches grouped by resume", body = ApiResponse<BestMatchesDto>),
        (status = 403, description = "Candidate role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn best_job_matches(
    RequireCandidate(user): RequireCandidate,
    State(service): State<Arc<ApplicationService>>,
) -> Result<Json<ApiResponse<BestMatchesDto>>> {
    let result = service.best_matches_for_user(user.id).await?;
    let message = result
        .matches_by_resume
        .is_empty()
        .then(|| match result.resumes_analyzed {
            0 => "No resumes uploaded yet".to_string(),
            _ => "No matching jobs found".to_string(),
        });
    Ok(Json(ApiResponse::success(Some(result), message, None)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/applications/{id}/skill-gap-analysis",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Covered and missing requirements", body = ApiResponse<SkillGapDto>),
        (status = 403, description = "Not a participant of this application"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn application_skill_gap(
    user: AuthenticatedUser,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SkillGapDto>>> {
    let gap = service.skill_gap(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(gap), None, None)))
}

/// Compare chosen applicant resumes on one of your jobs
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/compare-candidates",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = CompareCandidatesDto,
    responses(
        (status = 200, description = "All requested resumes, best first", body = ApiResponse<JobMatchResultsDto>),
        (status = 400, description = "Fewer than two resumes"),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Job or some resumes not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn compare_job_candidates(
    RequireHr(user): RequireHr,
    State(service): State<Arc<ApplicationService>>,
    Path(job_id): Path<Uuid>,
    AppJson(dto): AppJson<CompareCandidatesDto>,
) -> Result<Json<ApiResponse<JobMatchResultsDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let results = service.compare_candidates(user.id, job_id, &dto).await?;
    Ok(Json(ApiResponse::success(Some(results), None, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::applications::routes;
    use crate::features::jobs::services::JobService;
    use crate::features::resumes::services::ResumeService;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{lazy_pool, test_hub, with_candidate_auth, with_hr_auth};
    use axum_test::TestServer;
    use serde_json::json;

    fn service() -> Arc<ApplicationService> {
        let pool = lazy_pool();
        let hub = test_hub();
        let storage = Arc::new(LocalStorage::with_root(std::env::temp_dir()));
        Arc::new(ApplicationService::new(
            pool.clone(),
            Arc::new(JobService::new(pool.clone(), Arc::clone(&hub))),
            Arc::new(ResumeService::new(pool, storage, Arc::clone(&hub), None)),
            hub,
            None,
        ))
    }

    #[tokio::test]
    async fn test_apply_is_candidate_only() {
        let server = TestServer::new(with_hr_auth(routes::routes(service()))).unwrap();

        let response = server
            .post(&format!("/api/jobs/{}/apply", Uuid::now_v7()))
            .json(&json!({ "resume_id": Uuid::now_v7() }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_apply_requires_resume_id() {
        let server = TestServer::new(with_candidate_auth(routes::routes(service()))).unwrap();

        let response = server
            .post(&format!("/api/jobs/{}/apply", Uuid::now_v7()))
            .json(&json!({ "cover_letter": "Hello" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_hr_cannot_set_unknown_status() {
        let server = TestServer::new(with_hr_auth(routes::routes(service()))).unwrap();

        let response = server
            .put(&format!("/api/jobs/applications/{}", Uuid::now_v7()))
            .json(&json!({ "status": "archived" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rank_rejects_out_of_range_score() {
        let server = TestServer::new(with_hr_auth(routes::routes(service()))).unwrap();

        let response = server
            .post(&format!("/api/jobs/{}/match-analysis", Uuid::now_v7()))
            .json(&json!({ "min_score": 2.0 }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_candidate_stats_is_candidate_only() {
        let server = TestServer::new(with_hr_auth(routes::routes(service()))).unwrap();

        let response = server.get("/api/jobs/applications/stats/me").await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}
