//! Answer scoring.
//!
//! The scoring oracle is an external collaborator: given a question and the
//! candidate's answer it returns a score in `1..=5` and a short explanation.
//! The production oracle prompts a language model (see [`llm`]); tests use
//! in-memory oracles.
//!
//! Malformed model output is not an error: [`parse::parse_reply`] always
//! yields a score. Only transport/provider failures and timeouts surface as
//! [`ScoringError`], and [`RetryPolicy`] bounds how long a turn waits on them.

pub mod llm;
pub mod parse;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::interview::Score;

pub use llm::{create_oracle, LlmOracle};
pub use parse::{parse_reply, ParsedReply};

/// Errors from a scoring attempt.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Scoring request failed: {0}")]
    Request(String),

    #[error("Scoring timed out after {0:?}")]
    Timeout(Duration),

    #[error("Scoring unavailable after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<ScoringError> },
}

/// A scored answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub score: Score,
    pub explanation: String,
    /// True when the reply wasn't structured and the digit scan was used.
    pub fallback: bool,
}

impl Assessment {
    pub fn new(score: Score, explanation: impl Into<String>) -> Self {
        Self {
            score,
            explanation: explanation.into(),
            fallback: false,
        }
    }
}

impl From<ParsedReply> for Assessment {
    fn from(reply: ParsedReply) -> Self {
        let fallback = reply.is_fallback();
        let (score, explanation) = reply.into_parts();
        Self {
            score,
            explanation,
            fallback,
        }
    }
}

/// Maps a question/answer pair to a score.
///
/// Used as `Arc<dyn ScoringOracle>` and shared by every connection, so
/// implementations must not keep per-session state.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn score(&self, question: &str, answer: &str) -> Result<Assessment, ScoringError>;

    /// Short description for logging.
    fn description(&self) -> String;
}

/// Per-attempt timeout and attempt count for oracle calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

    pub fn new(timeout: Duration, max_attempts: u32) -> Self {
        Self {
            timeout,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            Self::DEFAULT_MAX_ATTEMPTS,
        )
    }
}

/// Score an answer, retrying hard failures and timeouts up to the policy's
/// attempt count.
pub async fn score_with_policy(
    oracle: &dyn ScoringOracle,
    policy: RetryPolicy,
    question: &str,
    answer: &str,
) -> Result<Assessment, ScoringError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = match tokio::time::timeout(policy.timeout, oracle.score(question, answer)).await
        {
            Ok(result) => result,
            Err(_) => Err(ScoringError::Timeout(policy.timeout)),
        };

        match result {
            Ok(assessment) => return Ok(assessment),
            Err(e) if attempt < policy.max_attempts => {
                tracing::warn!(
                    "Scoring attempt {}/{} failed, retrying: {}",
                    attempt,
                    policy.max_attempts,
                    e
                );
            }
            Err(e) => {
                return Err(ScoringError::Exhausted {
                    attempts: attempt,
                    last: Box::new(e),
                })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory oracles for protocol and server tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replies with queued raw model texts in order, then `{"score":3,...}`.
    #[derive(Default)]
    pub struct ScriptedOracle {
        replies: Mutex<VecDeque<Result<String, String>>>,
        calls: Mutex<Vec<(String, String)>>,
        delay: Option<Duration>,
    }

    impl ScriptedOracle {
        pub fn new<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
                ..Default::default()
            }
        }

        /// Shorthand for structured replies with the given scores.
        pub fn scores(scores: &[u8]) -> Self {
            Self::new(scores.iter().map(|s| {
                format!(r#"{{"score":{},"explanation":"Scored {}."}}"#, s, s)
            }))
        }

        pub fn failing(times: usize) -> Self {
            Self {
                replies: Mutex::new((0..times).map(|_| Err("provider down".into())).collect()),
                ..Default::default()
            }
        }

        pub fn then_reply(self, raw: impl Into<String>) -> Self {
            self.replies.lock().unwrap().push_back(Ok(raw.into()));
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScoringOracle for ScriptedOracle {
        async fn score(&self, question: &str, answer: &str) -> Result<Assessment, ScoringError> {
            self.calls
                .lock()
                .unwrap()
                .push((question.to_string(), answer.to_string()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.replies.lock().unwrap().pop_front();
            match next {
                Some(Ok(raw)) => Ok(parse_reply(&raw).into()),
                Some(Err(e)) => Err(ScoringError::Request(e)),
                None => Ok(Assessment::new(Score::NEUTRAL, "No scripted reply.")),
            }
        }

        fn description(&self) -> String {
            "scripted".to_string()
        }
    }
}
