//! CLI argument parsing using clap.
//!
//! Every flag overrides the matching value from the settings file.

use clap::Parser;
use std::path::PathBuf;

/// Interviewer - adaptive mock-interview server
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "interviewer")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to bind (default from settings: 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on; 0 picks a free port (default from settings: 8000)
    #[arg(long)]
    pub port: Option<u16>,

    /// Settings file (default: ~/.interviewer/settings.toml)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Override scoring provider from settings
    ///
    /// Options: openai, openrouter
    #[arg(short = 'p', long)]
    pub provider: Option<String>,

    /// Override model from settings
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// API key (overrides settings and env vars)
    #[arg(long, env = "INTERVIEWER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// TOML question bank replacing the built-in questions
    #[arg(short = 'q', long)]
    pub questions: Option<PathBuf>,

    /// Maximum concurrent interviews
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
