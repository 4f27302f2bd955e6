//! The interview protocol for one connection.
//!
//! ```text
//!   connect ──> send question ──> AwaitingAnswer ──(answer)──> score ──┐
//!                                   ^    │                             │
//!                                   │    └─(other message: ignored)    │
//!                                   └── send feedback + next question <┘
//!
//!   disconnect / shutdown / scoring unavailable ──> Terminated
//! ```
//!
//! The protocol is half-duplex: one outstanding question, one expected answer.
//! While the oracle is scoring, the socket is still polled so a disconnect ends
//! the session immediately and the late score is discarded. Answers that
//! arrive mid-turn are queued, up to [`MAX_BACKLOG`], and handled once the turn
//! completes. Anything else received mid-turn is dropped on arrival.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::transport::InterviewTransport;
use super::types::{ClientMessage, ServerMessage};
use crate::interview::{QuestionBank, Session, Transition};
use crate::scoring::{score_with_policy, RetryPolicy, ScoringOracle};

/// Sent before closing a session whose answer could not be scored.
pub const SCORING_UNAVAILABLE_MESSAGE: &str =
    "Sorry, your answer could not be scored right now. Please reconnect to start a new session.";

/// Answers held while a turn is being scored. Later ones are dropped.
pub const MAX_BACKLOG: usize = 8;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The client closed the connection.
    Disconnected,
    /// The server is shutting down or the connection was cancelled.
    Cancelled,
    /// The oracle failed on every attempt.
    ScoringUnavailable,
    /// A message could not be delivered to the client.
    SendFailed,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndReason::Disconnected => "client disconnected",
            EndReason::Cancelled => "cancelled",
            EndReason::ScoringUnavailable => "scoring unavailable",
            EndReason::SendFailed => "send failed",
        };
        f.write_str(s)
    }
}

/// Connection state between turns.
#[derive(Debug)]
pub enum ProtocolState {
    /// A question has been sent; the session holds it as pending.
    AwaitingAnswer(Session),
    Terminated(EndReason),
}

/// Drives one interview over a transport until it terminates.
pub struct Interview<T> {
    transport: T,
    bank: Arc<QuestionBank>,
    oracle: Arc<dyn ScoringOracle>,
    policy: RetryPolicy,
    cancel: CancellationToken,
    rng: StdRng,
    backlog: VecDeque<String>,
    session_id: Option<Uuid>,
}

impl<T: InterviewTransport> Interview<T> {
    pub fn new(
        transport: T,
        bank: Arc<QuestionBank>,
        oracle: Arc<dyn ScoringOracle>,
        policy: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            bank,
            oracle,
            policy,
            cancel,
            rng: StdRng::from_entropy(),
            backlog: VecDeque::new(),
            session_id: None,
        }
    }

    /// Use a fixed RNG for question draws.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Reuse an existing id (the connection id) for the session.
    pub fn with_session_id(mut self, id: Uuid) -> Self {
        self.session_id = Some(id);
        self
    }

    /// Run the interview to completion.
    pub async fn run(mut self) -> EndReason {
        let session = match self.session_id {
            Some(id) => Session::with_id(id, &self.bank, &mut self.rng),
            None => Session::start(&self.bank, &mut self.rng),
        };
        tracing::info!("Interview {} started", session.id());

        let mut state = self.ask(session).await;
        let reason = loop {
            match state {
                ProtocolState::AwaitingAnswer(session) => state = self.turn(session).await,
                ProtocolState::Terminated(reason) => break reason,
            }
        };

        if reason != EndReason::Disconnected && reason != EndReason::SendFailed {
            self.transport.close().await;
        }
        reason
    }

    /// Send the session's pending question.
    async fn ask(&mut self, session: Session) -> ProtocolState {
        let message = ServerMessage::question(session.pending_question(), session.stats());
        match self.transport.send(&message).await {
            Ok(()) => ProtocolState::AwaitingAnswer(session),
            Err(e) => {
                tracing::debug!("Interview {}: failed to send question: {}", session.id(), e);
                ProtocolState::Terminated(EndReason::SendFailed)
            }
        }
    }

    /// Handle the next answer: a queued one first, then the transport.
    async fn turn(&mut self, mut session: Session) -> ProtocolState {
        let answer = match self.backlog.pop_front() {
            Some(answer) => answer,
            None => {
                let raw = match self.next_message().await {
                    Ok(raw) => raw,
                    Err(reason) => return ProtocolState::Terminated(reason),
                };
                match ClientMessage::parse(&raw) {
                    Some(ClientMessage::Answer { answer }) => answer,
                    None => {
                        tracing::debug!("Interview {}: ignoring message {:?}", session.id(), raw);
                        return ProtocolState::AwaitingAnswer(session);
                    }
                }
            }
        };

        let question = session.pending_question().text.clone();
        let scored = {
            let scoring = score_with_policy(self.oracle.as_ref(), self.policy, &question, &answer);
            tokio::pin!(scoring);
            loop {
                tokio::select! {
                    result = &mut scoring => break result,
                    _ = self.cancel.cancelled() => {
                        return ProtocolState::Terminated(EndReason::Cancelled);
                    }
                    incoming = self.transport.recv_text() => match incoming {
                        Some(raw) => queue_answer(&mut self.backlog, session.id(), raw),
                        None => {
                            tracing::debug!(
                                "Interview {}: client left during scoring, discarding result",
                                session.id()
                            );
                            return ProtocolState::Terminated(EndReason::Disconnected);
                        }
                    },
                }
            }
        };

        let assessment = match scored {
            Ok(assessment) => assessment,
            Err(e) => {
                tracing::error!("Interview {}: {}", session.id(), e);
                let _ = self
                    .transport
                    .send(&ServerMessage::error(SCORING_UNAVAILABLE_MESSAGE))
                    .await;
                return ProtocolState::Terminated(EndReason::ScoringUnavailable);
            }
        };

        if assessment.fallback {
            tracing::warn!(
                "Interview {}: unstructured oracle reply, used score {}",
                session.id(),
                assessment.score.get()
            );
        }

        let transition = session.complete_turn(assessment.score, &self.bank, &mut self.rng);
        tracing::debug!(
            "Interview {}: scored {}, level {}, average {:.2}",
            session.id(),
            assessment.score.get(),
            session.level(),
            session.stats().average_score().unwrap_or_default()
        );
        match transition {
            Transition::Advanced { from, to } | Transition::Regressed { from, to } => {
                tracing::info!("Interview {}: level {} -> {}", session.id(), from, to);
            }
            Transition::Unchanged => {}
        }

        let feedback = ServerMessage::feedback(&assessment, session.stats());
        if let Err(e) = self.transport.send(&feedback).await {
            tracing::debug!("Interview {}: failed to send feedback: {}", session.id(), e);
            return ProtocolState::Terminated(EndReason::SendFailed);
        }
        self.ask(session).await
    }

    async fn next_message(&mut self) -> Result<String, EndReason> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(EndReason::Cancelled),
            incoming = self.transport.recv_text() => incoming.ok_or(EndReason::Disconnected),
        }
    }
}

/// Hold an answer received while scoring. Unrecognised frames and answers
/// past [`MAX_BACKLOG`] are dropped.
fn queue_answer(backlog: &mut VecDeque<String>, session_id: Uuid, raw: String) {
    match ClientMessage::parse(&raw) {
        Some(ClientMessage::Answer { answer }) if backlog.len() < MAX_BACKLOG => {
            backlog.push_back(answer);
        }
        Some(ClientMessage::Answer { .. }) => {
            tracing::warn!(
                "Interview {}: {} answers already queued, dropping another",
                session_id,
                MAX_BACKLOG
            );
        }
        None => tracing::debug!("Interview {}: ignoring message {:?}", session_id, raw),
    }
}
