use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::applications::handlers;
use crate::features::applications::services::ApplicationService;

pub fn routes(service: Arc<ApplicationService>) -> Router {
    Router::new()
        .route("/api/jobs/{id}/apply", post(handlers::apply_to_job))
        .route(
            "/api/jobs/{id}/match-analysis",
            post(handlers::rank_job_candidates),
        )
        .route(
            "/api/jobs/{id}/match-with-resume/{resume_id}",
            get(handlers::match_job_with_resume),
        )
        .route(
            "/api/jobs/{id}/compare-candidates",
            post(handlers::compare_job_candidates),
        )
        .route(
            "/api/jobs/best-matches/user-resumes",
            get(handlers::best_job_matches),
        )
        .route("/api/jobs/applications", get(handlers::list_my_applications))
        .route(
            "/api/jobs/applications/stats/me",
            get(handlers::my_application_stats),
        )
        .route(
            "/api/jobs/applications/{id}",
            get(handlers::get_application).put(handlers::update_application_status),
        )
        .route(
            "/api/jobs/applications/{id}/withdraw",
            post(handlers::withdraw_application),
        )
        .route(
            "/api/jobs/applications/{id}/match-analysis",
            get(handlers::application_match_analysis),
        )
        .route(
            "/api/jobs/applications/{id}/skill-gap-analysis",
            get(handlers::application_skill_gap),
        )
        .with_state(service)
}
