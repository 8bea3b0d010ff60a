use axum::{routing::get, Router};

use super::handler::{self, HealthState};

pub fn routes(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(handler::health_check))
        .with_state(state)
}
