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
use crate::features::interviews::dtos::{
    CreateInterviewDto, InterviewDto, InterviewFeedbackDto, InterviewListQuery,
    UpdateInterviewDto,
};
use crate::features::interviews::services::InterviewService;
use crate::shared::types::{ApiResponse, Meta, Paginated};

/// Window for `GET /api/interviews/upcoming`
const UPCOMING_DAYS: i64 = 7;

/// Schedule an interview for an application to one of your jobs
#[utoipa::path(
    post,
    path = "/api/interviews",
    tag = "interviews",
    request_body = CreateInterviewDto,
    responses(
        (status = 201, description = "Interview scheduled", body = ApiResponse<InterviewDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application was withdrawn")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_interview(
    RequireHr(user): RequireHr,
    State(service): State<Arc<InterviewService>>,
    AppJson(dto): AppJson<CreateInterviewDto>,
) -> Result<(StatusCode, Json<ApiResponse<InterviewDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let interview = service.create(user.id, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(interview),
            Some("Interview scheduled".to_string()),
            None,
        )),
    ))
}

/// Interviews on your jobs (HR) or your applications (candidate)
#[utoipa::path(
    get,
    path = "/api/interviews",
    tag = "interviews",
    params(InterviewListQuery),
    responses(
        (status = 200, description = "Page of interviews", body = ApiResponse<Paginated<InterviewDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No role selected")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_interviews(
    user: AuthenticatedUser,
    State(service): State<Arc<InterviewService>>,
    Query(query): Query<InterviewListQuery>,
) -> Result<Json<ApiResponse<Paginated<InterviewDto>>>> {
    let page = service.list(&user, &query).await?;
    let meta = page.meta();
    Ok(Json(ApiResponse::success(Some(page), None, Some(meta))))
}

/// Scheduled interviews in the next 7 days
#[utoipa::path(
    get,
    path = "/api/interviews/upcoming",
    tag = "interviews",
    responses(
        (status = 200, description = "Upcoming interviews", body = ApiResponse<Vec<InterviewDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upcoming_interviews(
    user: AuthenticatedUser,
    State(service): State<Arc<InterviewService>>,
) -> Result<Json<ApiResponse<Vec<InterviewDto>>>> {
    let interviews = service.upcoming(&user, UPCOMING_DAYS).await?;
    let total = interviews.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(interviews),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/interviews/{id}",
    tag = "interviews",
    params(("id" = Uuid, Path, description = "Interview ID")),
    responses(
        (status = 200, description = "Interview", body = ApiResponse<InterviewDto>),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Interview not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_interview(
    user: AuthenticatedUser,
    State(service): State<Arc<InterviewService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InterviewDto>>> {
    let interview = service.get(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(interview), None, None)))
}

#[utoipa::path(
    put,
    path = "/api/interviews/{id}",
    tag = "interviews",
    params(("id" = Uuid, Path, description = "Interview ID")),
    request_body = UpdateInterviewDto,
    responses(
        (status = 200, description = "Interview updated", body = ApiResponse<InterviewDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Interview not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_interview(
    RequireHr(user): RequireHr,
    State(service): State<Arc<InterviewService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateInterviewDto>,
) -> Result<Json<ApiResponse<InterviewDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let interview = service.update(user.id, id, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(interview),
        Some("Interview updated".to_string()),
        None,
    )))
}

/// Cancel an interview
#[utoipa::path(
    delete,
    path = "/api/interviews/{id}",
    tag = "interviews",
    params(("id" = Uuid, Path, description = "Interview ID")),
    responses(
        (status = 200, description = "Interview cancelled", body = ApiResponse<InterviewDto>),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Interview not found"),
        (status = 409, description = "Already cancelled or completed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_interview(
    RequireHr(user): RequireHr,
    State(service): State<Arc<InterviewService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InterviewDto>>> {
    let interview = service.cancel(user.id, id).await?;

    Ok(Json(ApiResponse::success(
        Some(interview),
        Some("Interview cancelled".to_string()),
        None,
    )))
}

/// Record interview feedback and complete the interview
#[utoipa::path(
    post,
    path = "/api/interviews/{id}/feedback",
    tag = "interviews",
    params(("id" = Uuid, Path, description = "Interview ID")),
    request_body = InterviewFeedbackDto,
    responses(
        (status = 200, description = "Feedback recorded", body = ApiResponse<InterviewDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the owner of this job"),
        (status = 404, description = "Interview not found"),
        (status = 409, description = "Interview was cancelled")
    ),
    security(("bearer_auth" = []))
)]
pub async fn interview_feedback(
    RequireHr(user): RequireHr,
    State(service): State<Arc<InterviewService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<InterviewFeedbackDto>,
) -> Result<Json<ApiResponse<InterviewDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let interview = service.add_feedback(user.id, id, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(interview),
        Some("Feedback recorded".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::applications::services::ApplicationService;
    use crate::features::interviews::routes;
    use crate::features::jobs::services::JobService;
    use crate::features::resumes::services::ResumeService;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{
        lazy_pool, test_hub, test_user, with_candidate_auth, with_hr_auth, with_user,
    };
    use axum_test::TestServer;
    use serde_json::json;

    fn service() -> Arc<InterviewService> {
        let pool = lazy_pool();
        let hub = test_hub();
        let storage = Arc::new(LocalStorage::with_root(std::env::temp_dir()));
        let applications = Arc::new(ApplicationService::new(
            pool.clone(),
            Arc::new(JobService::new(pool.clone(), Arc::clone(&hub))),
            Arc::new(ResumeService::new(pool.clone(), storage, Arc::clone(&hub), None)),
            Arc::clone(&hub),
            None,
        ));
        Arc::new(InterviewService::new(pool, applications, hub))
    }

    #[tokio::test]
    async fn test_schedule_is_hr_only() {
        let server = TestServer::new(with_candidate_auth(routes::routes(service()))).unwrap();

        let response = server
            .post("/api/interviews")
            .json(&json!({
                "application_id": Uuid::now_v7(),
                "title": "Intro call",
                "scheduled_at": "2030-01-01T10:00:00Z"
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_schedule_rejects_past_time() {
        let server = TestServer::new(with_hr_auth(routes::routes(service()))).unwrap();

        let response = server
            .post("/api/interviews")
            .json(&json!({
                "application_id": Uuid::now_v7(),
                "title": "Intro call",
                "scheduled_at": "2001-01-01T10:00:00Z"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_schedule_rejects_short_duration() {
        let server = TestServer::new(with_hr_auth(routes::routes(service()))).unwrap();

        let response = server
            .post("/api/interviews")
            .json(&json!({
                "application_id": Uuid::now_v7(),
                "title": "Intro call",
                "scheduled_at": "2030-01-01T10:00:00Z",
                "duration_minutes": 5
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_requires_role() {
        let server = TestServer::new(with_user(routes::routes(service()), test_user(None))).unwrap();

        let response = server.get("/api/interviews").await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_feedback_rating_is_checked() {
        let server = TestServer::new(with_hr_auth(routes::routes(service()))).unwrap();

        let response = server
            .post(&format!("/api/interviews/{}/feedback", Uuid::now_v7()))
            .json(&json!({ "feedback": "Great", "rating": 0, "recommendation": "hire" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
