//! Settings schema definitions for the interview server.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.
//! Missing fields are filled with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::scoring::{llm::DEFAULT_MAX_TOKENS, RetryPolicy};
use crate::server::DEFAULT_MAX_CONNECTIONS;

/// Root settings structure.
///
/// Loaded from `~/.interviewer/settings.toml` with environment variable
/// interpolation support. Version field enables future migrations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InterviewerSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Listener configuration
    pub server: ServerSettings,

    /// Scoring model configuration
    pub ai: AiSettings,

    /// Oracle timeout and retry behaviour
    pub scoring: ScoringSettings,

    /// Question bank source
    pub questions: QuestionSettings,

    /// Advanced/debug settings
    pub advanced: AdvancedSettings,
}

/// Listener and admission settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Live interviews allowed at once; further upgrades get 503
    pub max_connections: usize,
}

/// AI provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiSettings {
    /// Scoring provider: "openai" | "openrouter"
    pub provider: String,

    /// Model name for the selected provider
    pub model: String,

    /// Completion budget for one scoring reply
    pub max_tokens: u64,

    /// OpenAI settings
    pub openai: ProviderKeySettings,

    /// OpenRouter settings
    pub openrouter: ProviderKeySettings,
}

/// Credentials for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderKeySettings {
    /// API key (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Oracle timeout and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScoringSettings {
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,

    /// Attempts before the session is ended with an error
    pub max_attempts: u32,
}

/// Question bank settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct QuestionSettings {
    /// TOML question bank replacing the built-in questions (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_path: Option<String>,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log level: "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,
}

// =============================================================================
// Default implementations
// =============================================================================

impl Default for InterviewerSettings {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSettings::default(),
            ai: AiSettings::default(),
            scoring: ScoringSettings::default(),
            questions: QuestionSettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            openai: ProviderKeySettings::default(),
            openrouter: ProviderKeySettings::default(),
        }
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            timeout_secs: RetryPolicy::DEFAULT_TIMEOUT_SECS,
            max_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
