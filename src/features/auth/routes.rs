use crate::features::auth::handlers;
use crate::features::auth::services::AuthService;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Public auth routes (no authentication required)
pub fn public_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/github/login", get(handlers::github_login))
        .route("/api/auth/github/authorize", get(handlers::github_authorize))
        .with_state(service)
}

/// Protected auth routes (require JWT authentication)
pub fn protected_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/user", get(handlers::get_user))
        .route("/api/auth/update-role", post(handlers::update_role))
        .route("/api/auth/delete-account", delete(handlers::delete_account))
        .with_state(service)
}
