//! TOML-based settings for the interview server.
//!
//! Settings are loaded from `~/.interviewer/settings.toml` with environment
//! variable interpolation support. API keys may also come from the usual
//! provider environment variables through the `get_with_env_fallback` helper.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::settings::{SettingsManager, get_with_env_fallback};
//!
//! // Load settings
//! let manager = SettingsManager::new().await?;
//! let settings = manager.get();
//!
//! // Get a value with environment variable fallback
//! let api_key = get_with_env_fallback(
//!     &settings.ai.openai.api_key,
//!     &["OPENAI_API_KEY"],
//!     None,
//! );
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_with_env_fallback, settings_path, SettingsManager};
pub use schema::InterviewerSettings;
