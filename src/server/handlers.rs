//! HTTP and WebSocket handlers for the interview server.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::page::INDEX_HTML;
use super::protocol::Interview;
use super::registry::ConnectionRegistry;
use super::transport::{InterviewTransport, WebSocketTransport};
use super::types::*;
use crate::interview::QuestionBank;
use crate::scoring::{RetryPolicy, ScoringOracle};

/// Application state shared across all handlers
pub struct AppState {
    /// Questions drawn by every interview
    pub bank: Arc<QuestionBank>,
    /// Scores answers; shared by all connections
    pub oracle: Arc<dyn ScoringOracle>,
    pub retry_policy: RetryPolicy,
    /// Live connections, for admission control and listing
    pub registry: ConnectionRegistry,
    /// Shutdown token for graceful server shutdown
    pub shutdown_token: CancellationToken,
}

impl AppState {
    /// Create new application state with the given configuration
    pub fn new(
        bank: Arc<QuestionBank>,
        oracle: Arc<dyn ScoringOracle>,
        retry_policy: RetryPolicy,
        max_connections: usize,
    ) -> (Arc<Self>, CancellationToken) {
        let shutdown_token = CancellationToken::new();
        let state = Arc::new(Self {
            bank,
            oracle,
            retry_policy,
            registry: ConnectionRegistry::new(max_connections, shutdown_token.clone()),
            shutdown_token: shutdown_token.clone(),
        });
        (state, shutdown_token)
    }
}

/// Health check endpoint.
///
/// # Example Response
///
/// ```json
/// {
///   "status": "ok",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Serve the interview page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// List live interview connections.
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<ListSessionsResponse> {
    let sessions = state.registry.list();
    let count = sessions.len();

    Json(ListSessionsResponse {
        sessions,
        count,
        max_connections: state.registry.max_connections,
    })
}

/// End a live interview.
///
/// # Response
///
/// - `204 No Content`: The connection was signalled to close
/// - `400 Bad Request`: The id is not a UUID
/// - `404 Not Found`: No live connection with that id
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let id = Uuid::parse_str(&session_id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_code(
                format!("Invalid session id: {}", session_id),
                "INVALID_SESSION_ID",
            )),
        )
    })?;

    if state.registry.cancel(&id) {
        tracing::info!(session_id = %id, "Session cancelled via API");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::with_code(
                format!("Session not found: {}", session_id),
                "SESSION_NOT_FOUND",
            )),
        ))
    }
}

/// Upgrade to a WebSocket and run one interview on it.
///
/// # Response
///
/// - `101 Switching Protocols`: Interview started
/// - `503 Service Unavailable`: Connection limit reached
pub async fn interview_ws(
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if !state.registry.has_capacity() {
        tracing::warn!(
            max = state.registry.max_connections,
            "Rejecting interview: connection limit reached"
        );
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::with_code(
                format!(
                    "Connection limit ({}) reached",
                    state.registry.max_connections
                ),
                "CONNECTION_LIMIT_REACHED",
            )),
        )
            .into_response();
    }

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| run_interview(state, socket)),
        Err(rejection) => rejection.into_response(),
    }
}

async fn run_interview(state: Arc<AppState>, socket: WebSocket) {
    let mut transport = WebSocketTransport::new(socket);

    // Capacity was checked before the upgrade, but another client may have
    // taken the last slot since.
    let guard = match state.registry.register() {
        Ok(guard) => guard,
        Err(e) => {
            tracing::warn!("Closing upgraded socket: {}", e);
            transport.close().await;
            return;
        }
    };

    let session_id = guard.id();
    tracing::info!(%session_id, active = state.registry.count(), "Interview connected");

    let reason = Interview::new(
        transport,
        state.bank.clone(),
        state.oracle.clone(),
        state.retry_policy,
        guard.cancel_token(),
    )
    .with_session_id(session_id)
    .run()
    .await;

    tracing::info!(%session_id, %reason, "Interview ended");
}
