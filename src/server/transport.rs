//! Transport abstraction for the interview protocol.
//!
//! The protocol only needs "next text frame" and "send a message", so it is
//! written against [`InterviewTransport`] rather than a concrete socket. The
//! server uses [`WebSocketTransport`]; tests drive the protocol over channels.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};

use super::types::ServerMessage;
use crate::error::{InterviewError, Result};

/// A bidirectional, message-oriented connection to one client.
#[async_trait]
pub trait InterviewTransport: Send {
    /// Next text frame from the client, or `None` once the client is gone.
    ///
    /// Must be cancel-safe: the protocol polls it inside `tokio::select!`.
    async fn recv_text(&mut self) -> Option<String>;

    /// Send one message to the client.
    async fn send(&mut self, message: &ServerMessage) -> Result<()>;

    /// Best-effort close.
    async fn close(&mut self);
}

/// [`InterviewTransport`] over an axum WebSocket.
pub struct WebSocketTransport {
    socket: WebSocket,
}

impl WebSocketTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl InterviewTransport for WebSocketTransport {
    async fn recv_text(&mut self) -> Option<String> {
        loop {
            match self.socket.recv().await {
                Some(Ok(Message::Text(text))) => return Some(text.as_str().to_owned()),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(text),
                    Err(_) => tracing::debug!("Dropping non-UTF-8 binary frame"),
                },
                // Ping/pong replies are handled by axum
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | None => return None,
                Some(Err(e)) => {
                    tracing::debug!("WebSocket receive error: {}", e);
                    return None;
                }
            }
        }
    }

    async fn send(&mut self, message: &ServerMessage) -> Result<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| InterviewError::Transport(format!("Failed to serialize message: {}", e)))?;
        self.socket
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| InterviewError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.socket.send(Message::Close(None)).await;
    }
}
