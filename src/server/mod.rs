//! HTTP/WebSocket server for adaptive mock interviews.
//!
//! Each WebSocket connection runs one independent interview. Connections are
//! tracked for admission control only; interview state is owned by the task
//! serving the socket.
//!
//! # Architecture
//!
//! ```text
//! +------------------------------------------+
//! |  Axum HTTP Server                        |
//! |  / (GET)              -> interview page  |
//! |  /ws (GET)            -> interview (WS)  |
//! |  /health (GET)        -> health check    |
//! |  /sessions (GET)      -> list sessions   |
//! |  /sessions/{id} (DELETE) -> end session  |
//! +------------------------------------------+
//!          |
//!          v
//! +------------------------------------------+
//! |  ConnectionRegistry (DashMap)            |
//! |    +-- Connection 1: cancel token        |
//! |    +-- Connection 2: cancel token        |
//! |    +-- ... (max configurable)            |
//! +------------------------------------------+
//!          |
//!          v
//! +------------------------------------------+
//! |  Interview task (one per socket)         |
//! |    Session + QuestionBank + Oracle       |
//! +------------------------------------------+
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | / | Interview page |
//! | GET | /ws | Start an interview (WebSocket upgrade) |
//! | GET | /health | Health check |
//! | GET | /sessions | List live interviews |
//! | DELETE | /sessions/{id} | End a live interview |

mod handlers;
mod page;
pub mod protocol;
pub mod registry;
pub mod transport;
pub mod types;

pub use handlers::AppState;
pub use protocol::{EndReason, Interview};
pub use registry::{ConnectionRegistry, DEFAULT_MAX_CONNECTIONS};
pub use transport::{InterviewTransport, WebSocketTransport};
pub use types::{
    ClientMessage, ConnectionInfo, ErrorResponse, HealthResponse, ListSessionsResponse,
    ServerMessage,
};

use axum::{
    routing::{delete, get},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::interview::QuestionBank;
use crate::scoring::{RetryPolicy, ScoringOracle};

/// Listener and admission settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// Use 0 for a random available port.
    pub port: u16,
    pub max_connections: usize,
    pub retry_policy: RetryPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// A running server.
pub struct ServerHandle {
    /// The actual bound address (useful when port=0)
    pub addr: SocketAddr,
    /// Cancelling this stops accepting connections and ends every interview
    pub shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Cancel the server and wait for in-flight connections to drain.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Server task failed: {}", e);
        }
    }
}

/// Start the HTTP server.
///
/// Binds `config.host:config.port`, then serves in a background task until
/// the returned handle's token is cancelled.
///
/// # Example
///
/// ```ignore
/// let server = start_server(&config, bank, oracle).await?;
/// println!("Server listening on {}", server.addr);
///
/// // Later, to shut down:
/// server.shutdown().await;
/// ```
pub async fn start_server(
    config: &ServerConfig,
    bank: Arc<QuestionBank>,
    oracle: Arc<dyn ScoringOracle>,
) -> anyhow::Result<ServerHandle> {
    let (state, shutdown_token) =
        AppState::new(bank, oracle, config.retry_policy, config.max_connections);

    let app = create_router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Interview server listening on http://{}", actual_addr);

    let server_shutdown = shutdown_token.clone();
    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(server_shutdown.cancelled_owned())
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: actual_addr,
        shutdown: shutdown_token,
        task,
    })
}

/// Create the router with all routes configured.
///
/// This is separated from `start_server` to enable easier testing.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/ws", get(handlers::interview_ws))
        .route("/health", get(handlers::health))
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/{session_id}", delete(handlers::delete_session))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::ScriptedOracle;

    fn test_config(max_connections: usize) -> ServerConfig {
        ServerConfig {
            port: 0,
            max_connections,
            ..Default::default()
        }
    }

    fn builtin_bank() -> Arc<QuestionBank> {
        Arc::new(QuestionBank::builtin())
    }

    mod server_tests {
        use super::*;

        #[tokio::test]
        async fn start_server_binds_to_port() {
            let server = start_server(
                &test_config(10),
                builtin_bank(),
                Arc::new(ScriptedOracle::default()),
            )
            .await
            .expect("Server should start");

            assert!(server.addr.port() > 0);
            assert!(!server.shutdown.is_cancelled());

            server.shutdown().await;
        }

        #[tokio::test]
        async fn health_is_served_over_tcp() {
            let server = start_server(
                &test_config(10),
                builtin_bank(),
                Arc::new(ScriptedOracle::default()),
            )
            .await
            .unwrap();

            let mut stream = tokio::net::TcpStream::connect(server.addr).await.unwrap();
            use tokio::io::{AsyncReadExt, AsyncWriteExt};
            stream
                .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
                .await
                .unwrap();
            let mut response = String::new();
            stream.read_to_string(&mut response).await.unwrap();

            assert!(response.starts_with("HTTP/1.1 200"));
            assert!(response.contains("\"status\":\"ok\""));

            server.shutdown().await;
        }
    }

    mod websocket_tests {
        use super::*;
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::{connect_async, tungstenite::Message};

        async fn next_json<S>(ws: &mut S) -> serde_json::Value
        where
            S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
                + Unpin,
        {
            loop {
                let msg = ws.next().await.expect("stream ended").expect("ws error");
                if let Message::Text(text) = msg {
                    return serde_json::from_str(text.as_str()).unwrap();
                }
            }
        }

        #[tokio::test]
        async fn full_interview_round_trip() {
            let server = start_server(
                &test_config(10),
                builtin_bank(),
                Arc::new(ScriptedOracle::scores(&[5, 5])),
            )
            .await
            .unwrap();

            let (mut ws, _) = connect_async(format!("ws://{}/ws", server.addr))
                .await
                .unwrap();

            let first = next_json(&mut ws).await;
            assert_eq!(first["type"], "question");
            assert_eq!(first["level"], "easy");
            assert_eq!(first["time"], 120);
            assert_eq!(first["stats"]["answered"], 0);

            for expected_level in ["easy", "medium"] {
                ws.send(Message::text(
                    serde_json::json!({"type": "answer", "answer": "An answer"}).to_string(),
                ))
                .await
                .unwrap();

                let feedback = next_json(&mut ws).await;
                assert_eq!(feedback["type"], "feedback");
                assert_eq!(feedback["score"], 5);
                assert_eq!(feedback["stats"]["level"], expected_level);

                let question = next_json(&mut ws).await;
                assert_eq!(question["type"], "question");
                assert_eq!(question["level"], expected_level);
            }

            ws.close(None).await.unwrap();
            server.shutdown().await;
        }

        #[tokio::test]
        async fn connection_limit_rejects_handshake() {
            let server = start_server(
                &test_config(1),
                builtin_bank(),
                Arc::new(ScriptedOracle::default()),
            )
            .await
            .unwrap();
            let url = format!("ws://{}/ws", server.addr);

            let (mut first, _) = connect_async(&url).await.unwrap();
            // Wait for the first interview to register before connecting again
            assert_eq!(next_json(&mut first).await["type"], "question");

            match connect_async(&url).await {
                Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
                    assert_eq!(response.status(), 503);
                }
                other => panic!("expected HTTP 503, got {:?}", other.map(|(_, r)| r.status())),
            }

            first.close(None).await.unwrap();
            server.shutdown().await;
        }

        #[tokio::test]
        async fn shutdown_closes_live_interviews() {
            let server = start_server(
                &test_config(10),
                builtin_bank(),
                Arc::new(ScriptedOracle::default()),
            )
            .await
            .unwrap();

            let (mut ws, _) = connect_async(format!("ws://{}/ws", server.addr))
                .await
                .unwrap();
            assert_eq!(next_json(&mut ws).await["type"], "question");

            server.shutdown.cancel();

            let closed = tokio::time::timeout(std::time::Duration::from_secs(5), async {
                loop {
                    match ws.next().await {
                        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                        Some(Ok(_)) => continue,
                    }
                }
            })
            .await;
            assert!(closed.is_ok(), "socket should close after shutdown");
        }
    }
}
