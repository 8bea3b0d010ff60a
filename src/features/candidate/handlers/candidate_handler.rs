use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::guards::RequireCandidate;
use crate::features::candidate::dtos::CandidateDashboardDto;
use crate::features::candidate::services::CandidateService;
use crate::features::interviews::dtos::{InterviewDto, InterviewListQuery};
use crate::features::interviews::services::InterviewService;
use crate::shared::types::{ApiResponse, Meta, Paginated};

#[derive(Clone)]
pub struct CandidateState {
    pub service: Arc<CandidateService>,
    pub interviews: Arc<InterviewService>,
}

/// Stats, recent applications, recommended jobs and profile completion
#[utoipa::path(
    get,
    path = "/api/candidate/dashboard",
    tag = "candidate",
    responses(
        (status = 200, description = "Candidate dashboard", body = ApiResponse<CandidateDashboardDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Candidate role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn candidate_dashboard(
    RequireCandidate(user): RequireCandidate,
    State(state): State<CandidateState>,
) -> Result<Json<ApiResponse<CandidateDashboardDto>>> {
    let dashboard = state.service.dashboard(&user).await?;
    Ok(Json(ApiResponse::success(Some(dashboard), None, None)))
}

#[utoipa::path(
    get,
    path = "/api/candidate/interviews",
    tag = "candidate",
    params(InterviewListQuery),
    responses(
        (status = 200, description = "Page of your interviews", body = ApiResponse<Paginated<InterviewDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Candidate role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn candidate_interviews(
    RequireCandidate(user): RequireCandidate,
    State(state): State<CandidateState>,
    Query(query): Query<InterviewListQuery>,
) -> Result<Json<ApiResponse<Paginated<InterviewDto>>>> {
    let page = state.interviews.list(&user, &query).await?;
    let meta = page.meta();
    Ok(Json(ApiResponse::success(Some(page), None, Some(meta))))
}

/// Your scheduled interviews in the next 30 days
#[utoipa::path(
    get,
    path = "/api/candidate/interviews/upcoming",
    tag = "candidate",
    responses(
        (status = 200, description = "Upcoming interviews", body = ApiResponse<Vec<InterviewDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Candidate role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn candidate_upcoming_interviews(
    RequireCandidate(user): RequireCandidate,
    State(state): State<CandidateState>,
) -> Result<Json<ApiResponse<Vec<InterviewDto>>>> {
    let interviews = state.service.upcoming_interviews(&user).await?;
    let total = interviews.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(interviews),
        None,
        Some(Meta { total }),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::applications::services::ApplicationService;
    use crate::features::candidate::routes;
    use crate::features::jobs::services::JobService;
    use crate::features::resumes::services::ResumeService;
    use crate::features::users::services::UserService;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{lazy_pool, test_hub, with_hr_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;

    fn state() -> CandidateState {
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
        let interviews = Arc::new(InterviewService::new(
            pool.clone(),
            Arc::clone(&applications),
            hub,
        ));
        let service = Arc::new(CandidateService::new(
            pool.clone(),
            Arc::new(UserService::new(pool)),
            applications,
            Arc::clone(&interviews),
        ));
        CandidateState {
            service,
            interviews,
        }
    }

    #[tokio::test]
    async fn test_candidate_routes_require_authentication() {
        let server = TestServer::new(routes::routes(state())).unwrap();

        for path in [
            "/api/candidate/dashboard",
            "/api/candidate/interviews",
            "/api/candidate/interviews/upcoming",
        ] {
            server.get(path).await.assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_candidate_routes_reject_hr() {
        let server = TestServer::new(with_hr_auth(routes::routes(state()))).unwrap();

        server
            .get("/api/candidate/dashboard")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
