use axum::{routing::get, Router};

use crate::features::candidate::handlers::{self, CandidateState};

pub fn routes(state: CandidateState) -> Router {
    Router::new()
        .route("/api/candidate/dashboard", get(handlers::candidate_dashboard))
        .route("/api/candidate/interviews", get(handlers::candidate_interviews))
        .route(
            "/api/candidate/interviews/upcoming",
            get(handlers::candidate_upcoming_interviews),
        )
        .with_state(state)
}
