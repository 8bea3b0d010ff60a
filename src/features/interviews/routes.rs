use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::interviews::handlers;
use crate::features::interviews::services::InterviewService;

pub fn routes(service: Arc<InterviewService>) -> Router {
    Router::new()
        .route(
            "/api/interviews",
            get(handlers::list_interviews).post(handlers::create_interview),
        )
        .route("/api/interviews/upcoming", get(handlers::upcoming_interviews))
        .route(
            "/api/interviews/{id}",
            get(handlers::get_interview)
                .put(handlers::update_interview)
                .delete(handlers::cancel_interview),
        )
        .route("/api/interviews/{id}/feedback", post(handlers::interview_feedback))
        .with_state(service)
}
