use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::resumes::handlers::{self, ResumeState};

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn routes(state: ResumeState) -> Router {
    let body_limit = state.max_upload_size + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            "/api/resumes/upload",
            post(handlers::upload_resume).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/resumes/list", get(handlers::list_resumes))
        .route("/api/resumes", get(handlers::list_resumes))
        .route(
            "/api/resumes/{id}",
            get(handlers::get_resume).delete(handlers::delete_resume),
        )
        .route("/api/resumes/{id}/download", get(handlers::download_resume))
        .route("/api/resumes/{id}/insights", get(handlers::resume_insights))
        .with_state(state)
}
