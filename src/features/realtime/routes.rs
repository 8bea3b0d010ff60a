use axum::{routing::get, Router};

use crate::features::realtime::handlers::{self, RealtimeState};

/// WebSocket route. Authenticates itself, so it sits outside the auth layer.
pub fn routes(state: RealtimeState) -> Router {
    Router::new()
        .route("/ws", get(handlers::ws_handler))
        .with_state(state)
}
