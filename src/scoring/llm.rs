//! Language-model backed scoring oracle.
//!
//! Any rig completion model can score answers; [`create_oracle`] builds one for
//! the configured provider.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{AssistantContent, CompletionModel, CompletionRequest, Message};
use rig::message::{Text, UserContent};
use rig::one_or_many::OneOrMany;
use rig::providers::{openai, openrouter};

use super::parse::parse_reply;
use super::{Assessment, ScoringError, ScoringOracle};

/// System prompt for the interviewer persona.
pub const SCORING_PROMPT: &str = "You are an investment-banking interviewer. \
For the candidate answer you will:\n\
1. Give a single integer score 1-5 (5 = excellent).\n\
2. Briefly (<=30 words) justify the score.\n\
Return JSON like {\"score\":3,\"explanation\":\"...\"}";

/// Default completion token budget; the reply is a single short JSON object.
pub const DEFAULT_MAX_TOKENS: u64 = 60;

/// Supported remote providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    OpenRouter,
}

impl Provider {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "openrouter" => Some(Provider::OpenRouter),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::OpenRouter => "openrouter",
        }
    }
}

/// Format the user turn sent alongside [`SCORING_PROMPT`].
pub fn user_message(question: &str, answer: &str) -> String {
    format!("QUESTION: {}\nANSWER: {}", question, answer)
}

/// Scores answers by prompting a rig completion model.
pub struct LlmOracle<M> {
    model: M,
    label: String,
    max_tokens: u64,
}

impl<M> LlmOracle<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    pub fn new(model: M, label: impl Into<String>, max_tokens: u64) -> Self {
        Self {
            model,
            label: label.into(),
            max_tokens,
        }
    }

    fn request(&self, question: &str, answer: &str) -> CompletionRequest {
        let prompt = Message::User {
            content: OneOrMany::one(UserContent::Text(Text {
                text: user_message(question, answer),
            })),
        };

        CompletionRequest {
            preamble: Some(SCORING_PROMPT.to_string()),
            chat_history: OneOrMany::one(prompt),
            documents: vec![],
            tools: vec![],
            temperature: None,
            max_tokens: Some(self.max_tokens),
            tool_choice: None,
            additional_params: None,
        }
    }
}

#[async_trait]
impl<M> ScoringOracle for LlmOracle<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    async fn score(&self, question: &str, answer: &str) -> Result<Assessment, ScoringError> {
        let request = self.request(question, answer);

        let response = self
            .model
            .completion(request)
            .await
            .map_err(|e| ScoringError::Request(e.to_string()))?;

        let text = response
            .choice
            .iter()
            .filter_map(|c| {
                if let AssistantContent::Text(t) = c {
                    Some(t.text.clone())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(parse_reply(&text).into())
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}

/// Build the production oracle for `provider` and `model`.
pub fn create_oracle(
    provider: Provider,
    model: &str,
    api_key: &str,
    max_tokens: u64,
) -> Result<Arc<dyn ScoringOracle>> {
    let label = format!("{} ({})", provider.name(), model);
    tracing::info!("[scoring] Using remote LLM backend: {}", label);

    let oracle: Arc<dyn ScoringOracle> = match provider {
        Provider::OpenAi => {
            let client = openai::Client::new(api_key);
            Arc::new(LlmOracle::new(
                client.completion_model(model),
                label,
                max_tokens,
            ))
        }
        Provider::OpenRouter => {
            let client = openrouter::Client::new(api_key);
            Arc::new(LlmOracle::new(
                client.completion_model(model),
                label,
                max_tokens,
            ))
        }
    };
    Ok(oracle)
}
