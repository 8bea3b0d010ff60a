use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use utoipa::IntoParams;

use crate::core::error::{AppError, Result};
use crate::core::middleware::bearer_token;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::JwtValidator;
use crate::features::realtime::events::{ClientMessage, ConnectedEvent, RealtimeEvent};
use crate::features::realtime::hub::EventHub;

/// Shared state for the WebSocket route
#[derive(Clone)]
pub struct RealtimeState {
    pub hub: Arc<EventHub>,
    pub validator: Arc<JwtValidator>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WsQuery {
    /// Access token, for clients that cannot set headers on the upgrade
    pub token: Option<String>,
}

/// Open the live event channel
#[utoipa::path(
    get,
    path = "/ws",
    params(WsQuery),
    responses(
        (status = 101, description = "Switching to WebSocket; server sends RealtimeEvent messages"),
        (status = 400, description = "Not a WebSocket upgrade request"),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "realtime"
)]
pub async fn ws_handler(
    State(state): State<RealtimeState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    upgrade: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response> {
    // Authenticate before looking at the upgrade so bad credentials are a 401
    let token = match query.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => bearer_token(&headers)?.to_string(),
    };
    let user = state.validator.validate_token(&token).await?;

    let upgrade = upgrade.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let hub = Arc::clone(&state.hub);

    Ok(upgrade
        .on_upgrade(move |socket| run_connection(socket, hub, user))
        .into_response())
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: &RealtimeEvent,
) -> std::result::Result<(), ()> {
    let text = serde_json::to_string(event).map_err(|e| {
        tracing::error!("Failed to serialize {} event: {:?}", event.name(), e);
    })?;
    sink.send(Message::Text(text.into())).await.map_err(|e| {
        tracing::debug!("WebSocket send failed: {}", e);
    })
}

async fn run_connection(socket: WebSocket, hub: Arc<EventHub>, user: AuthenticatedUser) {
    let _guard = hub.connect();
    let (mut sink, mut incoming) = socket.split();
    // Subscribe before greeting so nothing published meanwhile is lost
    let mut events = BroadcastStream::new(hub.subscribe());

    tracing::info!(
        "WebSocket connected: user={} role={:?} active={}",
        user.id,
        user.role,
        hub.connection_count()
    );

    let greeting = RealtimeEvent::Connected(ConnectedEvent {
        user_id: user.id,
        role: user.role,
    });
    if send_event(&mut sink, &greeting).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            message = incoming.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(ClientMessage::Ping) = serde_json::from_str(text.as_str()) {
                        if send_event(&mut sink, &RealtimeEvent::Pong).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("WebSocket receive error for user {}: {}", user.id, e);
                    break;
                }
            },
            envelope = events.next() => match envelope {
                Some(Ok(envelope)) => {
                    if envelope.audience.includes(&user)
                        && send_event(&mut sink, &envelope.event).await.is_err()
                    {
                        break;
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    tracing::warn!("WebSocket for user {} lagged, skipped {} event(s)", user.id, skipped);
                }
                None => break,
            },
        }
    }

    tracing::info!("WebSocket closed: user={}", user.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::services::TokenService;
    use crate::features::realtime::routes;
    use crate::features::users::UserService;
    use crate::shared::test_helpers::{lazy_pool, test_hub};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use std::time::Duration;

    fn server() -> TestServer {
        let tokens = Arc::new(TokenService::from_secret(
            b"ws-test-secret",
            Duration::from_secs(60),
            0,
        ));
        let users = Arc::new(UserService::new(lazy_pool()));
        let state = RealtimeState {
            hub: test_hub(),
            validator: Arc::new(JwtValidator::new(tokens, users)),
        };
        TestServer::new(routes::routes(state)).unwrap()
    }

    #[tokio::test]
    async fn test_ws_without_token_is_unauthorized() {
        let response = server().get("/ws").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ws_with_invalid_token_is_unauthorized() {
        let response = server()
            .get("/ws")
            .add_query_param("token", "garbage")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ws_rejects_non_bearer_header() {
        let response = server()
            .get("/ws")
            .add_header("Authorization", "Basic Zm9vOmJhcg==")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
