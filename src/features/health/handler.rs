use axum::{extract::State, http::StatusCode, Json};
use sqlx::PgPool;
use std::sync::Arc;

use super::dto::{ComponentStatus, HealthDto, IntegrationFlags, ServiceStatus};
use crate::core::database;
use crate::features::realtime::EventHub;
use crate::modules::ai::QdrantClient;

#[derive(Clone)]
pub struct HealthState {
    pub pool: PgPool,
    pub hub: Arc<EventHub>,
    pub integrations: IntegrationFlags,
    pub qdrant: Option<Arc<QdrantClient>>,
}

/// Liveness plus database and integration status
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy", body = HealthDto),
        (status = 503, description = "Database unreachable", body = HealthDto)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthDto>) {
    let database = match database::ping(&state.pool).await {
        Ok(()) => ComponentStatus::Ok,
        Err(e) => {
            tracing::warn!("Health check database ping failed: {}", e);
            ComponentStatus::Error
        }
    };

    let (code, status) = match database {
        ComponentStatus::Ok => (StatusCode::OK, ServiceStatus::Healthy),
        ComponentStatus::Error => (StatusCode::SERVICE_UNAVAILABLE, ServiceStatus::Unhealthy),
    };

    let vector_store = match &state.qdrant {
        Some(client) if client.health().await => Some(ComponentStatus::Ok),
        Some(_) => Some(ComponentStatus::Error),
        None => None,
    };

    (
        code,
        Json(HealthDto {
            status,
            database,
            websocket_connections: state.hub.connection_count(),
            config: state.integrations,
            vector_store,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::health::routes;
    use crate::shared::test_helpers::{lazy_pool, test_hub};
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_health_reports_unreachable_database() {
        let hub = test_hub();
        let _connection = hub.connect();
        let state = HealthState {
            pool: lazy_pool(),
            hub,
            integrations: IntegrationFlags {
                groq: true,
                ..Default::default()
            },
            qdrant: None,
        };
        let server = TestServer::new(routes::routes(state)).unwrap();

        let response = server.get("/health").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["database"], "error");
        assert_eq!(body["websocket_connections"], 1);
        assert_eq!(body["config"]["groq"], true);
        assert_eq!(body["config"]["mistral"], false);
        assert!(body.get("vector_store").is_none());
    }
}
