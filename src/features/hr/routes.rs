use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::hr::handlers::{self, HrState};

pub fn routes(state: HrState) -> Router {
    Router::new()
        .route("/api/hr/jobs", get(handlers::list_hr_jobs))
        .route("/api/hr/jobs/bulk", post(handlers::bulk_job_action))
        .route("/api/hr/applications", get(handlers::list_hr_applications))
        .route(
            "/api/hr/applications/bulk",
            post(handlers::bulk_application_action),
        )
        .route(
            "/api/hr/applications/{id}/feedback",
            put(handlers::update_application_feedback),
        )
        .route("/api/hr/metrics", get(handlers::hr_metrics))
        .with_state(state)
}
