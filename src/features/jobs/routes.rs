use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

use crate::features::jobs::handlers;
use crate::features::jobs::services::JobService;

pub fn routes(service: Arc<JobService>) -> Router {
    Router::new()
        .route(
            "/api/jobs",
            get(handlers::list_jobs).post(handlers::create_job),
        )
        .route("/api/jobs/statistics", get(handlers::job_statistics))
        .route(
            "/api/jobs/{id}",
            get(handlers::get_job)
                .put(handlers::update_job)
                .delete(handlers::delete_job),
        )
        .route("/api/jobs/{id}/status", patch(handlers::update_job_status))
        .with_state(service)
}
