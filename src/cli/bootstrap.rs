//! CLI bootstrap - resolve settings and build the services the server needs.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use crate::error::InterviewError;
use crate::interview::QuestionBank;
use crate::scoring::llm::Provider;
use crate::scoring::{create_oracle, RetryPolicy, ScoringOracle};
use crate::server::ServerConfig;
use crate::settings::{get_with_env_fallback, InterviewerSettings, SettingsManager};

use super::args::Args;

/// Everything `main` needs to start serving.
pub struct ServerContext {
    pub config: ServerConfig,
    pub bank: Arc<QuestionBank>,
    pub oracle: Arc<dyn ScoringOracle>,
    /// Where settings were read from
    pub settings_path: PathBuf,
}

/// Load `.env`, then parse the command line.
///
/// The `.env` values must be in the environment before clap runs so that
/// `INTERVIEWER_API_KEY` reaches `--api-key`. The load error, if any, is
/// returned for [`initialize`] to report once logging is up.
pub fn load_args() -> (Args, Option<dotenvy::Error>) {
    load_args_from(|| dotenvy::dotenv().map(|_| ()), std::env::args_os())
}

fn load_args_from<I, T>(
    load_env: impl FnOnce() -> dotenvy::Result<()>,
    argv: I,
) -> (Args, Option<dotenvy::Error>)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let dotenv_error = load_env().err();
    (Args::parse_from(argv), dotenv_error)
}

/// Initialize logging, settings, the question bank and the scoring oracle.
pub async fn initialize(
    args: &Args,
    dotenv_error: Option<dotenvy::Error>,
) -> Result<ServerContext> {
    // Install TLS provider (required for rustls 0.23+)
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Load settings
    let settings_manager = match &args.config {
        Some(path) => SettingsManager::with_path(path.clone()).await,
        None => SettingsManager::new().await,
    }
    .context("Failed to initialize settings manager")?;
    let settings = settings_manager.get();

    init_logging(args, settings)?;

    if let Some(e) = dotenv_error {
        // Only warn on errors other than file not found
        if !matches!(e, dotenvy::Error::Io(_)) {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }
    tracing::debug!("Settings path: {}", settings_manager.path().display());

    let config = resolve_server_config(settings, args);

    let bank = match resolve_bank_path(settings, args) {
        Some(path) => QuestionBank::load(&path)
            .await
            .map_err(InterviewError::from)
            .with_context(|| format!("Failed to load question bank {:?}", path))?,
        None => QuestionBank::builtin(),
    };
    tracing::info!("Question bank ready with {} questions", bank.len());

    let provider_name = args.provider.as_deref().unwrap_or(&settings.ai.provider);
    let provider = Provider::parse(provider_name).ok_or_else(|| {
        InterviewError::Config(format!(
            "Unknown provider '{}'. Options: openai, openrouter",
            provider_name
        ))
    })?;
    let model = args.model.as_deref().unwrap_or(&settings.ai.model);
    let api_key = resolve_api_key(settings, provider, args)?;
    let oracle = create_oracle(provider, model, &api_key, settings.ai.max_tokens)?;

    Ok(ServerContext {
        config,
        bank: Arc::new(bank),
        oracle,
        settings_path: settings_manager.path().to_path_buf(),
    })
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` still applies; the crate's own level comes from `--verbose` or
/// `advanced.log_level`.
fn init_logging(args: &Args, settings: &InterviewerSettings) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        settings.advanced.log_level.as_str()
    };

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for target in ["interviewer", "interviewer_lib"] {
        let directive = format!("{}={}", target, log_level).parse().map_err(|e| {
            InterviewError::Config(format!("Invalid log level '{}': {}", log_level, e))
        })?;
        filter = filter.add_directive(directive);
    }

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    Ok(())
}

/// Merge listener and scoring settings with CLI overrides.
fn resolve_server_config(settings: &InterviewerSettings, args: &Args) -> ServerConfig {
    ServerConfig {
        host: args
            .host
            .clone()
            .unwrap_or_else(|| settings.server.host.clone()),
        port: args.port.unwrap_or(settings.server.port),
        max_connections: args
            .max_connections
            .unwrap_or(settings.server.max_connections),
        retry_policy: RetryPolicy::new(
            Duration::from_secs(settings.scoring.timeout_secs),
            settings.scoring.max_attempts,
        ),
    }
}

fn resolve_bank_path(settings: &InterviewerSettings, args: &Args) -> Option<PathBuf> {
    args.questions
        .clone()
        .or_else(|| settings.questions.bank_path.as_deref().map(expand_home))
}

/// Expand a leading `~` to the home directory; other paths are unchanged.
fn expand_home(path: &str) -> PathBuf {
    let rest = match path {
        "~" => Some(""),
        _ => path.strip_prefix("~/"),
    };
    match (rest, dirs::home_dir()) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Resolve API key from CLI args, settings, or environment variables.
fn resolve_api_key(
    settings: &InterviewerSettings,
    provider: Provider,
    args: &Args,
) -> Result<String, InterviewError> {
    // 1. CLI argument takes precedence
    if let Some(ref key) = args.api_key {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }

    // 2. Settings, then the provider's usual environment variable
    let from_settings = match provider {
        Provider::OpenRouter => get_with_env_fallback(
            &settings.ai.openrouter.api_key,
            &["OPENROUTER_API_KEY"],
            None,
        ),
        Provider::OpenAi => {
            get_with_env_fallback(&settings.ai.openai.api_key, &["OPENAI_API_KEY"], None)
        }
    };

    from_settings.ok_or_else(|| {
        InterviewError::Config(format!(
            "No API key found for provider '{}'. Set it in ~/.interviewer/settings.toml, \
             via environment variable, or use --api-key",
            provider.name()
        ))
    })
}
