//! Wire types for the WebSocket protocol and the HTTP endpoints.
//!
//! WebSocket frames are JSON objects discriminated by a `type` field. The
//! server sends `question`, `feedback` and `error`; the client sends `answer`.

use serde::{Deserialize, Serialize};

use crate::interview::{Category, Level, Question, Score, SessionStats};
use crate::scoring::Assessment;

// =============================================================================
// WebSocket protocol
// =============================================================================

/// Messages sent from the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A new question; `time` is the advisory answer budget in seconds.
    Question {
        text: String,
        category: Category,
        level: Level,
        time: u32,
        stats: SessionStats,
    },

    /// The score for the previous answer.
    Feedback {
        score: Score,
        explanation: String,
        stats: SessionStats,
    },

    /// Sent once before the server ends a session it cannot continue.
    Error { message: String },
}

impl ServerMessage {
    pub fn question(question: &Question, stats: &SessionStats) -> Self {
        ServerMessage::Question {
            text: question.text.clone(),
            category: question.category,
            level: question.level,
            time: question.level.time_budget_secs(),
            stats: stats.clone(),
        }
    }

    pub fn feedback(assessment: &Assessment, stats: &SessionStats) -> Self {
        ServerMessage::Feedback {
            score: assessment.score,
            explanation: assessment.explanation.clone(),
            stats: stats.clone(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

/// Messages sent from the client to the server.
///
/// Anything that does not deserialize into this enum (unknown `type`, missing
/// `type`, non-JSON) is ignored by the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Answer {
        #[serde(default)]
        answer: String,
    },
}

impl ClientMessage {
    /// Parse a raw text frame, returning `None` for anything unrecognised.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

// =============================================================================
// HTTP endpoints
// =============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Server status (always "ok" when healthy)
    pub status: String,
    /// Server version from Cargo.toml
    pub version: String,
}

impl HealthResponse {
    /// Create a healthy response with the current package version
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A live interview connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Connection ID (UUID v4)
    pub id: String,
    /// Milliseconds since the connection was accepted
    pub connected_ms: u64,
}

/// Response listing live connections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListSessionsResponse {
    pub sessions: Vec<ConnectionInfo>,
    pub count: usize,
    pub max_connections: usize,
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code for programmatic handling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: Some(code.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod server_message_tests {
        use super::*;

        #[test]
        fn question_serializes_with_time_budget_and_stats() {
            let question = Question {
                category: Category::Technical,
                level: Level::Medium,
                text: "Define enterprise value.".to_string(),
            };
            let msg = ServerMessage::question(&question, &SessionStats::default());
            let value = serde_json::to_value(&msg).unwrap();

            assert_eq!(
                value,
                json!({
                    "type": "question",
                    "text": "Define enterprise value.",
                    "category": "technical",
                    "level": "medium",
                    "time": 90,
                    "stats": {
                        "level": "easy",
                        "streak_up": 0,
                        "streak_down": 0,
                        "answered": 0,
                        "total_score": 0
                    }
                })
            );
        }

        #[test]
        fn feedback_serializes_score_as_number() {
            let assessment = Assessment::new(Score::new(4).unwrap(), "Good.");
            let stats = SessionStats {
                answered: 1,
                total_score: 4,
                streak_up: 1,
                ..Default::default()
            };
            let value = serde_json::to_value(ServerMessage::feedback(&assessment, &stats)).unwrap();

            assert_eq!(value["type"], "feedback");
            assert_eq!(value["score"], 4);
            assert_eq!(value["explanation"], "Good.");
            assert_eq!(value["stats"]["streak_up"], 1);
            assert_eq!(value["stats"]["total_score"], 4);
        }

        #[test]
        fn error_serializes_message() {
            let value = serde_json::to_value(ServerMessage::error("Try again later.")).unwrap();
            assert_eq!(value, json!({"type": "error", "message": "Try again later."}));
        }
    }

    mod client_message_tests {
        use super::*;

        #[test]
        fn parses_answer() {
            assert_eq!(
                ClientMessage::parse(r#"{"type":"answer","answer":"EV = equity + net debt"}"#),
                Some(ClientMessage::Answer {
                    answer: "EV = equity + net debt".to_string()
                })
            );
        }

        #[test]
        fn missing_answer_field_is_empty() {
            assert_eq!(
                ClientMessage::parse(r#"{"type":"answer"}"#),
                Some(ClientMessage::Answer {
                    answer: String::new()
                })
            );
        }

        #[test]
        fn ignores_other_types() {
            assert_eq!(ClientMessage::parse(r#"{"type":"ping"}"#), None);
            assert_eq!(ClientMessage::parse(r#"{"answer":"no type"}"#), None);
            assert_eq!(ClientMessage::parse("not json"), None);
            assert_eq!(ClientMessage::parse(r#"{"type":"answer","answer":42}"#), None);
        }
    }

    mod http_types_tests {
        use super::*;

        #[test]
        fn healthy_includes_version() {
            let resp = HealthResponse::healthy();
            assert_eq!(resp.status, "ok");
            assert_eq!(resp.version, env!("CARGO_PKG_VERSION"));
        }

        #[test]
        fn error_response_omits_missing_code() {
            let json = serde_json::to_string(&ErrorResponse::new("boom")).unwrap();
            assert_eq!(json, r#"{"error":"boom"}"#);

            let json =
                serde_json::to_string(&ErrorResponse::with_code("full", "CONNECTION_LIMIT_REACHED"))
                    .unwrap();
            assert!(json.contains("\"code\":\"CONNECTION_LIMIT_REACHED\""));
        }
    }
}
